//! Integration tests for Sitestats API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use serde_json::Value;
use tower::ServiceExt;

use common::{Reply, bls_payload, dol_payload, healthy_upstreams, osha_payload, upstreams};
use sitestats::api::{AppState, router};
use sitestats::config::DashboardConfig;
use sitestats::dashboard::Dashboard;

fn create_test_server(config: DashboardConfig) -> TestServer {
    let state = AppState {
        dashboard: Dashboard::new(config).unwrap(),
    };

    TestServer::new(router(state)).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server(DashboardConfig::default());

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_endpoint_oneshot() {
    let state = AppState {
        dashboard: Dashboard::new(DashboardConfig::default()).unwrap(),
    };

    let response = router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_dashboard() {
    let server = create_test_server(healthy_upstreams().await);

    let response = server.get("/dashboard").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["metrics"]["total_employment"], 158000.0);
    assert_eq!(body["metrics"]["total_spending"], 66_400_000.0);
    assert_eq!(body["metrics"]["contract_count"], 3);
    assert_eq!(body["metrics"]["average_wage"], 0.0);
    assert_eq!(body["sources"]["labor_statistics"]["outcome"], "available");
    assert_eq!(body["sources"]["safety"]["title"], "OSHA Safety Data");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_get_dashboard_with_partial_failure() {
    let config = upstreams(
        Reply::Json(bls_payload(&["158000", "155000"])),
        Reply::Json(serde_json::json!({})),
        Reply::Json(osha_payload()),
        Reply::Json(dol_payload()),
    )
    .await;
    let server = create_test_server(config);

    let response = server.get("/dashboard").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["sources"]["spending"]["outcome"], "error");
    assert_eq!(body["sources"]["spending"]["label"], "Error");
    assert_eq!(body["sources"]["spending"]["error"], "No USA Spending data found");
    assert_eq!(body["sources"]["labor_market"]["outcome"], "available");
    assert_eq!(body["metrics"]["contract_count"], 0);
    assert_eq!(body["metrics"]["total_employment"], 158000.0);
}

#[tokio::test]
async fn test_get_dashboard_with_nothing_configured() {
    let config = DashboardConfig {
        spending_base_url: Some(common::closed_url().await),
        ..DashboardConfig::default()
    };
    let server = create_test_server(config);

    let response = server.get("/dashboard").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["metrics"]["total_employment"], 0.0);
    assert_eq!(body["sources"]["labor_statistics"]["outcome"], "unavailable");
    assert_eq!(body["sources"]["spending"]["outcome"], "error");
}

#[tokio::test]
async fn test_get_source_detail() {
    let server = create_test_server(healthy_upstreams().await);

    let response = server.get("/dashboard/sources/osha").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["source"], "safety");
    assert_eq!(body["status"]["outcome"], "available");
    assert_eq!(body["summary"]["inspection_count"], 2);
    assert_eq!(body["summary"]["violation_count"], 1);
}

#[tokio::test]
async fn test_get_source_detail_trend() {
    let server = create_test_server(healthy_upstreams().await);

    let response = server.get("/dashboard/sources/bls").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["source"], "labor_statistics");
    let trend = body["trend"].as_array().unwrap();
    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0]["date"], "2024-11-01");
    assert_eq!(trend[1]["value"], 158000.0);
}

#[tokio::test]
async fn test_get_source_detail_invalid_source() {
    let server = create_test_server(DashboardConfig::default());

    let response = server.get("/dashboard/sources/fred").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
