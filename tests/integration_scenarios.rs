//! Integration tests for the three scenario classes driven end to end.

mod common;

use windgrid_sim::grid::{GridCode, GridCondition};
use windgrid_sim::sim::kpi::RunReport;
use windgrid_sim::sim::scenario::{GridFault, RunLength, Scenario, ScenarioSpec, TurbineFailure};
use windgrid_sim::turbine::curve::CUT_OUT_SPEED_MS;
use windgrid_sim::turbine::{PowerCurve, TurbineId, TurbineState};

fn failure_spec(ticks: u64) -> ScenarioSpec {
    ScenarioSpec::new(
        Scenario::TurbineFailure(TurbineFailure {
            turbine_id: TurbineId(1),
            failure_time_s: 1800.0,
            degradation_lead_s: 1800.0,
        }),
        RunLength::Ticks(ticks),
    )
}

fn fault_spec() -> ScenarioSpec {
    ScenarioSpec::new(
        Scenario::GridFault(GridFault {
            fault_start_s: 3600.0,
            fault_duration_s: 10.0,
            voltage_floor_pu: 0.2,
            recovery_s: 5.0,
        }),
        RunLength::Duration(3620.0),
    )
}

#[test]
fn full_power_fixture_wind_sits_on_the_rated_plateau() {
    let curve = PowerCurve::reference(common::NOMINAL_KW).unwrap();
    assert!(curve.rated_wind_speed_ms() < common::ABOVE_RATED_WIND_MS);
    assert!(common::ABOVE_RATED_WIND_MS < CUT_OUT_SPEED_MS);
    assert_eq!(curve.power_kw(common::ABOVE_RATED_WIND_MS), common::NOMINAL_KW);
}

#[test]
fn normal_run_produces_one_record_per_turbine_per_tick() {
    let mut engine = common::engine(common::normal_spec(60), 4, 10.0);
    let records = engine.run();
    assert_eq!(records.len(), 240);
    common::assert_per_turbine_order(&records);
    assert!(records.iter().all(|r| r.state == TurbineState::Operational));
    assert!(records.iter().all(|r| r.flags.ride_through_ok && !r.flags.degraded));
    assert!(records.iter().all(|r| r.grid_voltage_pu == 1.0));
}

#[test]
fn failure_halfway_through_degradation() {
    let mut engine = common::engine(failure_spec(1801), 2, common::ABOVE_RATED_WIND_MS);
    let records = engine.run();

    // one second steps: tick index equals simulated seconds
    let halfway = common::record_at(&records, 900, 1).unwrap();
    assert_eq!(halfway.state, TurbineState::Degrading);
    assert!((halfway.progress - 0.5).abs() < 1e-12);
    assert!((halfway.power_kw - 0.65 * common::NOMINAL_KW).abs() < 1e-9);
    assert!((halfway.vibration_mm_s - 6.0).abs() < 1e-9);
    assert!((halfway.bearing_temp_c - 62.5).abs() < 1e-9);

    let failed = common::record_at(&records, 1800, 1).unwrap();
    assert_eq!(failed.state, TurbineState::Failed);
    assert_eq!(failed.power_kw, 0.0);
    assert_eq!(failed.rotor_rpm, 0.0);
    assert_eq!(failed.progress, 1.0);

    let healthy = common::record_at(&records, 1800, 2).unwrap();
    assert_eq!(healthy.state, TurbineState::Operational);
    assert_eq!(healthy.power_kw, common::NOMINAL_KW);
}

#[test]
fn degradation_progress_never_decreases() {
    let mut engine = common::engine(failure_spec(2000), 1, 14.0);
    let records = engine.run();
    assert!(records.windows(2).all(|w| w[1].progress >= w[0].progress));
    assert!(
        records
            .iter()
            .skip_while(|r| r.state != TurbineState::Failed)
            .all(|r| r.state == TurbineState::Failed)
    );
}

#[test]
fn grid_fault_profile_and_lvrt_response() {
    let spec = fault_spec();
    assert_eq!(spec.step_s(), 0.1);
    let mut engine = common::engine(spec, 1, common::ABOVE_RATED_WIND_MS);
    let records = engine.run();
    assert_eq!(records.len(), 36_200);

    let before = common::record_at(&records, 35_999, 1).unwrap();
    assert_eq!(before.grid_voltage_pu, 1.0);
    assert!(!before.flags.lvrt_active);
    assert_eq!(before.power_kw, common::NOMINAL_KW);
    assert!(before.reactive_kvar > 0.0);

    let onset = common::record_at(&records, 36_000, 1).unwrap();
    assert_eq!(onset.timestamp_s, 3600.0);
    assert_eq!(onset.grid_voltage_pu, 0.2);
    assert!(onset.flags.lvrt_active);
    assert!(onset.flags.ride_through_ok);
    let expected_kw = common::NOMINAL_KW * (0.2 - 0.05) / (0.9 - 0.05);
    assert!((onset.power_kw - expected_kw).abs() < 1e-9);
    // capped at 40% of nominal
    assert!((onset.reactive_kvar - 800.0).abs() < 1e-9);

    // 0.2 pu is only tolerated for 0.15 s
    let breached = common::record_at(&records, 36_002, 1).unwrap();
    assert!(!breached.flags.ride_through_ok);
    let still_low = common::record_at(&records, 36_099, 1).unwrap();
    assert_eq!(still_low.grid_voltage_pu, 0.2);
    assert!(!still_low.flags.ride_through_ok);

    let recovering = common::record_at(&records, 36_125, 1).unwrap();
    assert!((recovering.grid_voltage_pu - 0.6).abs() < 1e-9);

    let recovered = common::record_at(&records, 36_150, 1).unwrap();
    assert_eq!(recovered.grid_voltage_pu, 1.0);
    assert!(!recovered.flags.lvrt_active);
    assert!(recovered.flags.ride_through_ok);
    assert_eq!(recovered.power_kw, common::NOMINAL_KW);

    let report = RunReport::from_records(&records, 0.1);
    assert_eq!(report.min_voltage_pu, 0.2);
    assert!(report.lvrt_ticks >= 100);
    assert!(report.ride_through_violations > 0);
}

#[test]
fn voltage_swell_absorbs_reactive_power() {
    let spec = ScenarioSpec::new(
        Scenario::GridFault(GridFault {
            fault_start_s: 1.0,
            fault_duration_s: 0.5,
            voltage_floor_pu: 1.15,
            recovery_s: 0.0,
        }),
        RunLength::Duration(3.0),
    );
    let mut engine = common::engine(spec, 2, common::ABOVE_RATED_WIND_MS);
    let records = engine.run();

    let swell: Vec<_> = records.iter().filter(|r| r.flags.hvrt_active).collect();
    // ticks 10..=14, two turbines
    assert_eq!(swell.len(), 10);
    assert!(swell.iter().all(|r| r.reactive_kvar < 0.0));
    assert!(swell.iter().all(|r| r.power_kw == common::NOMINAL_KW));
    // 0.5 s at 1.15 pu is inside the 1 s envelope
    assert!(records.iter().all(|r| r.flags.ride_through_ok));
}

#[test]
fn reactive_sign_follows_voltage_band() {
    let code = GridCode::default();
    let low = code.dynamic_reactive_power(500.0, 0.85, 2000.0).unwrap();
    let high = code.dynamic_reactive_power(500.0, 1.15, 2000.0).unwrap();
    assert_eq!(low, 250.0);
    assert_eq!(high, -250.0);
    assert!(code.dynamic_reactive_power(500.0, 0.0, 2000.0).is_err());
}

#[test]
fn permissible_power_is_monotone_and_bounded() {
    let code = GridCode::default();
    let mut previous = 0.0;
    for i in 1..=120 {
        let v = f64::from(i) * 0.01;
        let p = code.lvrt_permissible_power(v, 1500.0).unwrap();
        assert!((0.0..=1500.0).contains(&p), "p={p} at v={v}");
        assert!(p >= previous, "not monotone at v={v}");
        previous = p;
    }
    assert_eq!(previous, 1500.0);
}

#[test]
fn non_physical_condition_is_rejected() {
    let code = GridCode::default();
    for cond in [
        GridCondition {
            voltage_pu: -0.1,
            frequency_hz: 50.0,
        },
        GridCondition {
            voltage_pu: 1.0,
            frequency_hz: 0.0,
        },
        GridCondition {
            voltage_pu: f64::NAN,
            frequency_hz: 50.0,
        },
    ] {
        assert!(code.evaluate(&cond, 1000.0, 2000.0).is_err());
    }
}

#[test]
fn zero_voltage_fault_runs_degraded() {
    let spec = ScenarioSpec::new(
        Scenario::GridFault(GridFault {
            fault_start_s: 0.5,
            fault_duration_s: 0.3,
            voltage_floor_pu: 0.0,
            recovery_s: 0.0,
        }),
        RunLength::Ticks(12),
    );
    let mut engine = common::engine(spec, 1, 10.0);
    let records = engine.run();
    assert_eq!(records.len(), 12);
    let degraded: Vec<u64> = records
        .iter()
        .filter(|r| r.flags.degraded)
        .map(|r| r.tick)
        .collect();
    assert_eq!(degraded, vec![5, 6, 7]);
    assert!(records.iter().all(|r| r.grid_voltage_pu > 0.0));
}
