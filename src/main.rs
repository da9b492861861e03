//! Sitestats - labor, spending, and safety statistics for a state's construction sector.
//!
//! # Usage
//!
//! - `sitestats` - serve the HTTP API
//! - `sitestats refresh` - run one refresh and print the report as JSON
//!
//! # API Endpoints
//!
//! - `GET /dashboard` - Metrics and per-source status
//! - `GET /dashboard/sources/:source` - Detail view for one source
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sitestats::api::{AppState, router};
use sitestats::config::DashboardConfig;
use sitestats::dashboard::Dashboard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("sitestats=info".parse()?))
        .init();

    let config = DashboardConfig::from_env()?;
    let port = config.port;

    info!(
        state = %config.state,
        start_year = config.start_year,
        end_year = config.end_year,
        "Loaded configuration"
    );

    let dashboard = Dashboard::new(config)?;

    if env::args().nth(1).as_deref() == Some("refresh") {
        let report = dashboard.refresh().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let state = AppState { dashboard };
    let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Sitestats is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
