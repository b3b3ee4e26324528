//! REST API for a completed run's report and telemetry.
//!
//! Provides two GET endpoints:
//! - `/state` returns scenario, grid code, run report and the last tick's records
//! - `/telemetry` returns records with optional time range and turbine filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::grid::GridCode;
use crate::sim::kpi::RunReport;
use crate::sim::scenario::ScenarioSpec;
use crate::telemetry::TelemetryRecord;

pub use types::{ErrorResponse, StateResponse, TelemetryQuery};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only so handlers take no locks.
pub struct AppState {
    /// Run parameters used for this run.
    pub spec: ScenarioSpec,
    /// Compliance thresholds used for this run.
    pub grid_code: GridCode,
    pub report: RunReport,
    /// Every record of the run, in emission order.
    pub records: Vec<TelemetryRecord>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
