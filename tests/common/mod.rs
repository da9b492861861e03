//! Local stand-ins for the upstream statistics APIs.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use sitestats::config::DashboardConfig;

pub const BLS_KEY: &str = "test-bls-key";
pub const OSHA_TOKEN: &str = "test-osha-token";
pub const DOL_TOKEN: &str = "test-dol-token";

/// What a mock upstream answers with.
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Status(StatusCode),
    Text(&'static str),
    /// Nothing is listening at the URL.
    Down,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(body) => Json(body).into_response(),
            Reply::Status(status) => status.into_response(),
            Reply::Text(body) => (StatusCode::OK, body).into_response(),
            Reply::Down => unreachable!("mock_upstream serves nothing for Reply::Down"),
        }
    }
}

/// Serve `reply` at `path`, answering 401 unless `required_header` matches.
pub async fn mock_upstream(
    path: &str,
    required_header: Option<(&'static str, String)>,
    reply: Reply,
) -> String {
    if matches!(reply, Reply::Down) {
        return closed_url().await;
    }

    let handler = move |headers: HeaderMap| {
        let reply = reply.clone();
        let required_header = required_header.clone();
        async move {
            if let Some((name, expected)) = required_header {
                let actual = headers.get(name).and_then(|v| v.to_str().ok());
                if actual != Some(expected.as_str()) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
            }
            reply.into_response()
        }
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route(path, any(handler));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// JSON request bodies received by a [`recording_upstream`].
pub type Received = Arc<Mutex<Vec<Value>>>;

/// Like [`mock_upstream`] without a header check, keeping each JSON body received.
pub async fn recording_upstream(path: &str, reply: Reply) -> (String, Received) {
    let received = Received::default();
    let log = received.clone();

    let handler = move |body: Bytes| {
        let reply = reply.clone();
        let log = log.clone();
        async move {
            if let Ok(value) = serde_json::from_slice::<Value>(&body) {
                log.lock().unwrap().push(value);
            }
            reply.into_response()
        }
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route(path, any(handler));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

/// A URL on which nothing accepts connections.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub async fn bls_upstream(reply: Reply) -> String {
    mock_upstream(
        "/timeseries/data/",
        Some(("BLS-API-KEY", BLS_KEY.to_string())),
        reply,
    )
    .await
}

pub async fn spending_upstream(reply: Reply) -> String {
    mock_upstream("/search/spending_by_award/", None, reply).await
}

pub async fn osha_upstream(reply: Reply) -> String {
    mock_upstream(
        "/inspections",
        Some(("Authorization", format!("Bearer {}", OSHA_TOKEN))),
        reply,
    )
    .await
}

pub async fn dol_upstream(reply: Reply) -> String {
    mock_upstream(
        "/timeseries",
        Some(("Authorization", format!("Bearer {}", DOL_TOKEN))),
        reply,
    )
    .await
}

/// BLS reply with the construction employment series, most recent first.
pub fn bls_payload(values: &[&str]) -> Value {
    bls_payload_for("CES2023230001", values)
}

/// BLS reply carrying `series_id` with the given values, most recent first.
pub fn bls_payload_for(series_id: &str, values: &[&str]) -> Value {
    let data: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "year": "2024",
                "period": format!("M{:02}", 12 - i),
                "periodName": "",
                "value": v,
            })
        })
        .collect();

    json!({
        "status": "REQUEST_SUCCEEDED",
        "message": [],
        "Results": {
            "series": [
                { "seriesID": series_id, "data": data },
                { "seriesID": "CES2023230002", "data": [] }
            ]
        }
    })
}

pub fn spending_payload(obligations: &[f64]) -> Value {
    let results: Vec<Value> = obligations
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            json!({
                "award_id": format!("AWD-{}", i),
                "recipient_name": format!("Contractor {}", i),
                "total_obligation": amount,
                "award_date": "2024-04-15",
                "naics_code": "237310",
                "naics_description": "Highway, Street, and Bridge Construction",
            })
        })
        .collect();

    json!({ "results": results, "page_metadata": { "page": 1, "hasNext": false } })
}

pub fn osha_payload() -> Value {
    json!({
        "results": [
            {
                "activity_nr": "1001",
                "estab_name": "Shore Excavating",
                "city": "Toms River",
                "state": "NJ",
                "inspection_date": "2024-05-02",
                "inspection_type": "Planned",
                "violation_type": "Serious",
                "penalty_amount": 16131.0
            },
            {
                "activity_nr": "1002",
                "estab_name": "Passaic Crane Service",
                "city": "Paterson",
                "state": "NJ",
                "inspection_date": "2024-06-11",
                "inspection_type": "Complaint",
                "violation_type": null,
                "penalty_amount": 0.0
            }
        ]
    })
}

pub fn dol_payload() -> Value {
    json!({
        "series": [{
            "series_id": "CES2023230001",
            "title": "Construction employment",
            "data": [
                { "year": "2024", "period": "M12", "value": 158.0 },
                { "year": "2024", "period": "M11", "value": 155.0 }
            ]
        }]
    })
}

/// Configuration pointing every source at the given base URLs.
pub fn config_for(bls: &str, spending: &str, osha: &str, dol: &str) -> DashboardConfig {
    DashboardConfig {
        bls_api_key: Some(BLS_KEY.to_string()),
        osha_api_token: Some(OSHA_TOKEN.to_string()),
        dol_api_token: Some(DOL_TOKEN.to_string()),
        bls_base_url: Some(bls.to_string()),
        spending_base_url: Some(spending.to_string()),
        osha_base_url: Some(osha.to_string()),
        dol_base_url: Some(dol.to_string()),
        ..DashboardConfig::default()
    }
}

/// Start all four upstreams with the given replies.
pub async fn upstreams(bls: Reply, spending: Reply, osha: Reply, dol: Reply) -> DashboardConfig {
    let bls = bls_upstream(bls).await;
    let spending = spending_upstream(spending).await;
    let osha = osha_upstream(osha).await;
    let dol = dol_upstream(dol).await;
    config_for(&bls, &spending, &osha, &dol)
}

/// All four upstreams healthy.
pub async fn healthy_upstreams() -> DashboardConfig {
    upstreams(
        Reply::Json(bls_payload(&["158000", "155000"])),
        Reply::Json(spending_payload(&[12_500_000.0, 8_900_000.0, 45_000_000.0])),
        Reply::Json(osha_payload()),
        Reply::Json(dol_payload()),
    )
    .await
}
