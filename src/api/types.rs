//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::grid::GridCode;
use crate::sim::kpi::RunReport;
use crate::sim::scenario::ScenarioSpec;
use crate::telemetry::TelemetryRecord;

/// Combined state response: run parameters, report and latest records.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub scenario: ScenarioSpec,
    pub grid_code: GridCode,
    pub report: RunReport,
    /// One record per turbine from the final tick.
    pub latest: Vec<TelemetryRecord>,
}

/// Optional filters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start time in seconds (inclusive).
    pub from: Option<f64>,
    /// End time in seconds (inclusive).
    pub to: Option<f64>,
    /// Restrict to one turbine id.
    pub turbine: Option<u32>,
}

impl TelemetryQuery {
    /// Whether `record` passes the filters. `from`/`to` must already be checked.
    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        let from = self.from.unwrap_or(f64::NEG_INFINITY);
        let to = self.to.unwrap_or(f64::INFINITY);
        record.timestamp_s >= from
            && record.timestamp_s <= to
            && self.turbine.is_none_or(|id| record.turbine_id.0 == id)
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
