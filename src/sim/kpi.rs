//! Post-hoc run report computed from telemetry records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::telemetry::TelemetryRecord;
use crate::turbine::{TurbineId, TurbineState};

/// Aggregate indicators derived from a complete run.
///
/// Computed post-hoc from the record sequence so reported figures always
/// agree with the exported telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Distinct ticks covered by the records.
    pub ticks: usize,
    /// Distinct turbines covered by the records.
    pub turbines: usize,
    /// Fleet energy delivered to the grid (MWh).
    pub energy_mwh: f64,
    /// Highest fleet active power in a single tick (kW).
    pub peak_fleet_kw: f64,
    /// Lowest grid voltage seen (pu).
    pub min_voltage_pu: f64,
    /// Highest grid voltage seen (pu).
    pub max_voltage_pu: f64,
    /// Ticks spent in the LVRT band.
    pub lvrt_ticks: usize,
    /// Ticks spent in the HVRT band.
    pub hvrt_ticks: usize,
    /// Ticks where the ride-through envelope was exceeded.
    pub ride_through_violations: usize,
    /// Records produced from substituted inputs.
    pub degraded_records: usize,
    /// Turbines that ended the run failed.
    pub failed_turbines: Vec<TurbineId>,
    /// Mean reactive power per record (kvar).
    pub mean_reactive_kvar: f64,
}

#[derive(Default)]
struct TickAgg {
    fleet_kw: f64,
    lvrt: bool,
    hvrt: bool,
    violation: bool,
}

impl RunReport {
    /// Computes the report.
    ///
    /// # Arguments
    ///
    /// * `records` - Every record of the run
    /// * `step_s` - Tick length in seconds, used for energy integration
    pub fn from_records(records: &[TelemetryRecord], step_s: f64) -> Self {
        if records.is_empty() {
            return Self {
                ticks: 0,
                turbines: 0,
                energy_mwh: 0.0,
                peak_fleet_kw: 0.0,
                min_voltage_pu: 0.0,
                max_voltage_pu: 0.0,
                lvrt_ticks: 0,
                hvrt_ticks: 0,
                ride_through_violations: 0,
                degraded_records: 0,
                failed_turbines: Vec::new(),
                mean_reactive_kvar: 0.0,
            };
        }

        let mut per_tick: BTreeMap<u64, TickAgg> = BTreeMap::new();
        let mut turbines = BTreeSet::new();
        let mut failed = BTreeSet::new();
        let mut energy_kwh = 0.0;
        let mut reactive_sum = 0.0;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        let mut degraded = 0;

        for r in records {
            let agg = per_tick.entry(r.tick).or_default();
            agg.fleet_kw += r.power_kw;
            agg.lvrt |= r.flags.lvrt_active;
            agg.hvrt |= r.flags.hvrt_active;
            agg.violation |= !r.flags.ride_through_ok;

            turbines.insert(r.turbine_id);
            if r.state == TurbineState::Failed {
                failed.insert(r.turbine_id);
            }
            energy_kwh += r.power_kw * step_s / 3600.0;
            reactive_sum += r.reactive_kvar;
            min_v = min_v.min(r.grid_voltage_pu);
            max_v = max_v.max(r.grid_voltage_pu);
            if r.flags.degraded {
                degraded += 1;
            }
        }

        Self {
            ticks: per_tick.len(),
            turbines: turbines.len(),
            energy_mwh: energy_kwh / 1000.0,
            peak_fleet_kw: per_tick.values().map(|a| a.fleet_kw).fold(0.0, f64::max),
            min_voltage_pu: min_v,
            max_voltage_pu: max_v,
            lvrt_ticks: per_tick.values().filter(|a| a.lvrt).count(),
            hvrt_ticks: per_tick.values().filter(|a| a.hvrt).count(),
            ride_through_violations: per_tick.values().filter(|a| a.violation).count(),
            degraded_records: degraded,
            failed_turbines: failed.into_iter().collect(),
            mean_reactive_kvar: reactive_sum / records.len() as f64,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        writeln!(f, "Ticks x turbines:      {} x {}", self.ticks, self.turbines)?;
        writeln!(f, "Fleet energy:          {:.3} MWh", self.energy_mwh)?;
        writeln!(f, "Peak fleet output:     {:.1} kW", self.peak_fleet_kw)?;
        writeln!(
            f,
            "Grid voltage range:    {:.3} .. {:.3} pu",
            self.min_voltage_pu, self.max_voltage_pu
        )?;
        writeln!(
            f,
            "LVRT / HVRT ticks:     {} / {}",
            self.lvrt_ticks, self.hvrt_ticks
        )?;
        writeln!(f, "Ride-through breaches: {}", self.ride_through_violations)?;
        writeln!(f, "Degraded records:      {}", self.degraded_records)?;
        writeln!(f, "Mean reactive power:   {:.1} kvar", self.mean_reactive_kvar)?;
        if self.failed_turbines.is_empty() {
            write!(f, "Failed turbines:       none")
        } else {
            let ids: Vec<String> = self.failed_turbines.iter().map(|id| id.to_string()).collect();
            write!(f, "Failed turbines:       {}", ids.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FrequencyBand;
    use crate::telemetry::ComplianceFlags;

    fn make_record(tick: u64, turbine: u32, power_kw: f64, voltage_pu: f64) -> TelemetryRecord {
        TelemetryRecord {
            tick,
            timestamp_s: tick as f64,
            turbine_id: TurbineId(turbine),
            wind_speed_ms: 10.0,
            wind_direction_deg: 270.0,
            power_kw,
            reactive_kvar: 100.0,
            grid_voltage_pu: voltage_pu,
            grid_frequency_hz: 50.0,
            state: TurbineState::Operational,
            flags: ComplianceFlags {
                lvrt_active: voltage_pu <= 0.9,
                hvrt_active: voltage_pu >= 1.1,
                ride_through_ok: true,
                frequency_band: FrequencyBand::Continuous,
                degraded: false,
            },
            progress: 0.0,
            vibration_mm_s: 2.0,
            bearing_temp_c: 45.0,
            rotor_rpm: 13.4,
            blade_pitch_deg: 0.0,
        }
    }

    #[test]
    fn energy_and_peak() {
        // two turbines, 1000 kW each, for 3600 one-second ticks = 2 MWh
        let records: Vec<TelemetryRecord> = (0..3600)
            .flat_map(|t| [make_record(t, 1, 1000.0, 1.0), make_record(t, 2, 1000.0, 1.0)])
            .collect();
        let report = RunReport::from_records(&records, 1.0);
        assert!((report.energy_mwh - 2.0).abs() < 1e-9);
        assert_eq!(report.peak_fleet_kw, 2000.0);
        assert_eq!(report.ticks, 3600);
        assert_eq!(report.turbines, 2);
    }

    #[test]
    fn band_ticks_count_once_per_tick() {
        let records = vec![
            make_record(0, 1, 0.0, 0.5),
            make_record(0, 2, 0.0, 0.5),
            make_record(1, 1, 0.0, 1.15),
            make_record(1, 2, 0.0, 1.15),
            make_record(2, 1, 0.0, 1.0),
            make_record(2, 2, 0.0, 1.0),
        ];
        let report = RunReport::from_records(&records, 0.1);
        assert_eq!(report.lvrt_ticks, 1);
        assert_eq!(report.hvrt_ticks, 1);
        assert_eq!(report.min_voltage_pu, 0.5);
        assert_eq!(report.max_voltage_pu, 1.15);
    }

    #[test]
    fn failed_and_degraded() {
        let mut records = vec![make_record(0, 1, 0.0, 1.0), make_record(0, 2, 0.0, 1.0)];
        records[1].state = TurbineState::Failed;
        records[0].flags.degraded = true;
        records[0].flags.ride_through_ok = false;
        let report = RunReport::from_records(&records, 1.0);
        assert_eq!(report.failed_turbines, vec![TurbineId(2)]);
        assert_eq!(report.degraded_records, 1);
        assert_eq!(report.ride_through_violations, 1);
        assert!(report.to_string().contains("WT02"));
    }

    #[test]
    fn empty_records() {
        let report = RunReport::from_records(&[], 1.0);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.energy_mwh, 0.0);
        assert!(report.failed_turbines.is_empty());
    }
}
