//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery};
use crate::telemetry::TelemetryRecord;

/// Returns run parameters, report and the final tick's records.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let latest = match state.records.last() {
        Some(last) => {
            let start = state
                .records
                .iter()
                .rposition(|r| r.tick != last.tick)
                .map_or(0, |i| i + 1);
            state.records[start..].to_vec()
        }
        None => Vec::new(),
    };

    Json(StateResponse {
        scenario: state.spec,
        grid_code: state.grid_code.clone(),
        report: state.report.clone(),
        latest,
    })
}

/// Returns telemetry records, optionally filtered.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=1.5&to=3&turbine=2` → filtered (time range inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(f64::NEG_INFINITY);
    let to = query.to.unwrap_or(f64::INFINITY);

    if from.is_nan() || to.is_nan() || from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .records
        .iter()
        .filter(|r| query.matches(r))
        .copied()
        .collect();

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::grid::GridCode;
    use crate::sim::engine::Engine;
    use crate::sim::kpi::RunReport;
    use crate::sim::scenario::{RunLength, Scenario, ScenarioSpec};
    use crate::turbine::{PowerCurve, TurbineId, TurbineUnit};
    use crate::wind::ConstantWind;

    fn make_test_state() -> Arc<AppState> {
        let spec = ScenarioSpec::new(Scenario::Normal, RunLength::Ticks(24));
        let turbines = (1..=2)
            .map(|id| {
                TurbineUnit::new(TurbineId(id), PowerCurve::reference(2000.0).unwrap(), 2000.0)
                    .unwrap()
            })
            .collect();
        let wind = ConstantWind {
            speed_ms: 10.0,
            direction_deg: 270.0,
        };
        let mut engine = Engine::new(spec, turbines, wind, GridCode::default()).unwrap();
        let records = engine.run();
        let report = RunReport::from_records(&records, engine.step_s());
        Arc::new(AppState {
            spec,
            grid_code: GridCode::default(),
            report,
            records,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn state_returns_200() {
        let (status, json) = get_json("/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scenario"]["scenario"]["kind"], "normal");
        assert_eq!(json["report"]["ticks"], 24);
        assert!(json.get("grid_code").is_some());

        let latest = json["latest"].as_array().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0]["tick"], 23);
        assert_eq!(latest[1]["turbine_id"], 2);
    }

    #[tokio::test]
    async fn telemetry_returns_all_records() {
        let (status, json) = get_json("/telemetry").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 48);
    }

    #[tokio::test]
    async fn telemetry_range_query() {
        let (status, json) = get_json("/telemetry?from=5&to=10").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        // ticks 5..=10, two turbines each
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0]["tick"], 5);
        assert_eq!(rows[11]["tick"], 10);
    }

    #[tokio::test]
    async fn telemetry_turbine_filter() {
        let (status, json) = get_json("/telemetry?turbine=2&to=3").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r["turbine_id"] == 2));
    }

    #[tokio::test]
    async fn telemetry_invalid_range_returns_400() {
        let (status, json) = get_json("/telemetry?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }
}
