//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use windgrid_sim::api::{AppState, router};
use windgrid_sim::config::ScenarioConfig;
use windgrid_sim::sim::kpi::RunReport;

/// Runs the voltage swell preset and wraps the result as API state.
fn build_api_state() -> Arc<AppState> {
    let cfg = ScenarioConfig::voltage_swell();
    let mut engine = cfg.build().unwrap();
    let records = engine.run();
    let report = RunReport::from_records(&records, engine.step_s());
    Arc::new(AppState {
        spec: *engine.spec(),
        grid_code: engine.grid_code().clone(),
        report,
        records,
    })
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reports_scenario_and_latest_tick() {
    let (status, json) = get("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scenario"]["scenario"]["kind"], "grid_fault");
    assert_eq!(json["scenario"]["scenario"]["voltage_floor_pu"], 1.15);
    assert_eq!(json["grid_code"]["hvrt_threshold_pu"], 1.1);
    assert_eq!(json["report"]["ticks"], 600);
    assert!(json["report"]["hvrt_ticks"].as_u64().unwrap() > 0);

    let latest = json["latest"].as_array().unwrap();
    assert_eq!(latest.len(), 5);
    assert!(latest.iter().all(|r| r["tick"] == 599));
}

#[tokio::test]
async fn telemetry_window_during_swell() {
    let (status, json) = get("/telemetry?from=30&to=30.45&turbine=3").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    // t = 30.0 ..= 30.4
    assert_eq!(rows.len(), 5);
    for row in rows {
        assert_eq!(row["turbine_id"], 3);
        assert_eq!(row["flags"]["hvrt_active"], true);
        assert_eq!(row["flags"]["ride_through_ok"], true);
        assert!(row["reactive_kvar"].as_f64().unwrap() <= 0.0);
    }
}

#[tokio::test]
async fn telemetry_record_schema() {
    let (_, json) = get("/telemetry?to=0").await;
    let first = json.as_array().unwrap()[0].as_object().unwrap().clone();
    for key in [
        "tick",
        "timestamp_s",
        "turbine_id",
        "wind_speed_ms",
        "wind_direction_deg",
        "power_kw",
        "reactive_kvar",
        "grid_voltage_pu",
        "grid_frequency_hz",
        "state",
        "flags",
        "progress",
        "vibration_mm_s",
        "bearing_temp_c",
        "rotor_rpm",
        "blade_pitch_deg",
    ] {
        assert!(first.contains_key(key), "missing key: {key}");
    }
    assert_eq!(first["state"], "operational");
    assert_eq!(first["flags"]["frequency_band"], "continuous");
}

#[tokio::test]
async fn inverted_range_returns_400() {
    let (status, json) = get("/telemetry?from=40&to=30").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("must be <="));
}
