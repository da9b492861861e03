//! HTTP API handlers for Sitestats.
//!
//! The dashboard endpoint always answers 200: a refresh in which every
//! source failed still renders zeroed metrics and error cards.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::{info, instrument, warn};

use crate::dashboard::{Dashboard, DashboardReport, SourceDetail};
use crate::model::SourceName;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/sources/:source", get(get_source_detail))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /dashboard - Refresh every source and return metrics and statuses.
///
/// # Response
///
/// ```json
/// {
///     "generated_at": "2024-06-01T12:00:00Z",
///     "metrics": {
///         "total_employment": 158000.0,
///         "employment_growth": 1.94,
///         "total_spending": 66400000.0,
///         "contract_count": 3,
///         "average_wage": 0.0,
///         "unemployment_rate": 0.0
///     },
///     "sources": {
///         "labor_statistics": { "outcome": "available", ... },
///         "safety": { "outcome": "error", "error": "No OSHA data found", ... }
///     }
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardReport> {
    let report = state.dashboard.refresh().await;

    if let Some(error) = &report.error {
        warn!(error = %error, "Dashboard served with refresh error");
    } else {
        info!(contract_count = report.metrics.contract_count, "Dashboard queried");
    }

    Json(report)
}

/// GET /dashboard/sources/:source - Detail view for one source.
///
/// Accepts `labor_statistics`, `spending`, `safety`, `labor_market` and the
/// aliases `bls`, `usaspending`, `osha`, `dol`.
#[instrument(skip(state))]
pub async fn get_source_detail(
    State(state): State<AppState>,
    Path(source_str): Path<String>,
) -> Result<Json<SourceDetail>, StatusCode> {
    let source: SourceName = source_str.parse().map_err(|_| {
        warn!(source = %source_str, "Invalid source");
        StatusCode::BAD_REQUEST
    })?;

    let detail = state.dashboard.source_detail(source).await;
    info!(
        source = %source,
        outcome = detail.status().outcome.label(),
        "Source detail queried"
    );

    Ok(Json(detail))
}
