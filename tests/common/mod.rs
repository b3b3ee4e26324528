//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use windgrid_sim::grid::GridCode;
use windgrid_sim::sim::engine::Engine;
use windgrid_sim::sim::scenario::{RunLength, Scenario, ScenarioSpec};
use windgrid_sim::telemetry::TelemetryRecord;
use windgrid_sim::turbine::{PowerCurve, TurbineId, TurbineUnit};
use windgrid_sim::wind::ConstantWind;

/// Nameplate rating used by every fixture turbine (kW).
pub const NOMINAL_KW: f64 = 2000.0;

/// Wind speed inside the reference curve's full-power plateau, above the
/// 17 m/s rated speed and below cut-out (m/s).
pub const ABOVE_RATED_WIND_MS: f64 = 20.0;

/// Fleet of `n` turbines with ids `1..=n` on the reference curve.
pub fn fleet(n: u32) -> Vec<TurbineUnit> {
    (1..=n)
        .map(|id| {
            let curve = PowerCurve::reference(NOMINAL_KW).expect("reference curve is valid");
            TurbineUnit::new(TurbineId(id), curve, NOMINAL_KW).expect("nominal is positive")
        })
        .collect()
}

/// Steady westerly wind.
pub fn constant_wind(speed_ms: f64) -> ConstantWind {
    ConstantWind {
        speed_ms,
        direction_deg: 270.0,
    }
}

/// Engine over `n` reference turbines in constant wind with the default grid code.
pub fn engine(spec: ScenarioSpec, n: u32, wind_ms: f64) -> Engine<ConstantWind> {
    Engine::new(spec, fleet(n), constant_wind(wind_ms), GridCode::default())
        .expect("fixture engine should build")
}

/// Normal-operation run of exactly `ticks` ticks.
pub fn normal_spec(ticks: u64) -> ScenarioSpec {
    ScenarioSpec::new(Scenario::Normal, RunLength::Ticks(ticks))
}

/// The record of `turbine` at `tick`, if present.
pub fn record_at(records: &[TelemetryRecord], tick: u64, turbine: u32) -> Option<&TelemetryRecord> {
    records
        .iter()
        .find(|r| r.tick == tick && r.turbine_id == TurbineId(turbine))
}

/// Asserts that per-turbine timestamps strictly increase.
pub fn assert_per_turbine_order(records: &[TelemetryRecord]) {
    use std::collections::HashMap;

    let mut last: HashMap<TurbineId, f64> = HashMap::new();
    for r in records {
        if let Some(prev) = last.insert(r.turbine_id, r.timestamp_s) {
            assert!(
                r.timestamp_s > prev,
                "{} went back in time: {prev} then {}",
                r.turbine_id,
                r.timestamp_s
            );
        }
    }
}
