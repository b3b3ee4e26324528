//! Simulation engine that steps the fleet through a scenario.

use std::collections::HashSet;

use tracing::{info, warn};

use super::clock::{SimClock, Tick};
use super::runner::CancelToken;
use super::scenario::ScenarioSpec;
use crate::error::{Result, SimError};
use crate::grid::{GridCode, GridCondition, RideThroughCurves, RideThroughTracker};
use crate::telemetry::{ComplianceFlags, Publisher, TelemetryRecord};
use crate::turbine::{FailurePlan, TurbineUnit};
use crate::wind::{WindFeed, WindSample};

/// Upper bound on the records `Engine::run` reserves before the first tick.
const RUN_RESERVE_RECORDS: usize = 4096;

/// Summary of a streamed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks fully evaluated and published.
    pub ticks: u64,
    /// Records handed to the publisher.
    pub records: u64,
    /// `true` if the run stopped early on request.
    pub cancelled: bool,
}

/// Simulation engine owning the fleet, the clock and the wind feed.
///
/// Generic over `W: WindFeed` for static dispatch. One engine drives one
/// run; its state only moves forward.
pub struct Engine<W: WindFeed> {
    spec: ScenarioSpec,
    turbines: Vec<TurbineUnit>,
    wind: W,
    grid_code: GridCode,
    clock: SimClock,
    ride_through: RideThroughTracker,
    failure: Option<(usize, FailurePlan)>,
    last_grid: GridCondition,
    last_wind: WindSample,
}

impl<W: WindFeed> Engine<W> {
    /// Creates a new engine.
    ///
    /// # Arguments
    ///
    /// * `spec` - Scenario, step size and run length
    /// * `turbines` - The fleet, each with a unique id
    /// * `wind` - Wind input
    /// * `grid_code` - Compliance thresholds
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidScenario` for bad scenario parameters or an
    /// empty fleet, `SimError::DuplicateTurbine` when an id repeats, and
    /// `SimError::UnknownTurbine` when the failure scenario names a turbine
    /// outside the fleet.
    pub fn new(
        spec: ScenarioSpec,
        turbines: Vec<TurbineUnit>,
        wind: W,
        grid_code: GridCode,
    ) -> Result<Self> {
        spec.validate()?;
        if turbines.is_empty() {
            return Err(SimError::InvalidScenario {
                field: "fleet.turbines",
                message: "must contain at least one turbine".into(),
            });
        }
        let mut seen = HashSet::with_capacity(turbines.len());
        for t in &turbines {
            if !seen.insert(t.id()) {
                return Err(SimError::DuplicateTurbine(t.id()));
            }
        }

        let failure = match spec.failure() {
            Some(f) => {
                let idx = turbines
                    .iter()
                    .position(|t| t.id() == f.turbine_id)
                    .ok_or(SimError::UnknownTurbine(f.turbine_id))?;
                Some((idx, f.plan()))
            }
            None => None,
        };

        let nominal = GridCondition::nominal(grid_code.nominal_frequency_hz);
        nominal.validate()?;
        let clock = SimClock::new(spec.step_s(), spec.total_ticks())?;
        let ride_through = RideThroughTracker::new(RideThroughCurves::reference()?);

        Ok(Self {
            spec,
            turbines,
            wind,
            grid_code,
            clock,
            ride_through,
            failure,
            last_grid: nominal,
            last_wind: WindSample {
                speed_ms: 0.0,
                direction_deg: 0.0,
            },
        })
    }

    /// Advances one tick and returns one record per turbine, in fleet order.
    ///
    /// # Returns
    ///
    /// `None` once the run length is exhausted.
    pub fn tick(&mut self) -> Option<Vec<TelemetryRecord>> {
        let tick = self.clock.tick()?;
        let mut records = Vec::with_capacity(self.turbines.len());
        self.step(tick, |r| records.push(r));
        Some(records)
    }

    /// Executes all remaining ticks and returns every record.
    pub fn run(&mut self) -> Vec<TelemetryRecord> {
        let reserve = usize::try_from(self.remaining_ticks())
            .ok()
            .and_then(|ticks| ticks.checked_mul(self.turbines.len()))
            .map_or(RUN_RESERVE_RECORDS, |n| n.min(RUN_RESERVE_RECORDS));
        let mut records = Vec::with_capacity(reserve);
        self.log_start();
        while let Some(tick) = self.clock.tick() {
            self.step(tick, |r| records.push(r));
        }
        info!(records = records.len(), "run finished");
        records
    }

    /// Executes the remaining ticks, pushing every record into `publisher`.
    ///
    /// Cancellation is checked before each tick, so a cancelled run never
    /// publishes a partial tick. The publisher is closed on return, whatever
    /// the outcome, so consumers always observe end of stream.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Pipeline` when a consumer stalls beyond the
    /// pipeline's limit.
    pub fn run_into(&mut self, mut publisher: Publisher, cancel: &CancelToken) -> Result<RunOutcome> {
        let mut outcome = RunOutcome {
            ticks: 0,
            records: 0,
            cancelled: false,
        };
        self.log_start();

        while !cancel.is_cancelled() {
            let Some(tick) = self.clock.tick() else {
                break;
            };
            let mut failure = None;
            self.step(tick, |r| {
                if failure.is_none() {
                    failure = publisher.push(r).err();
                }
            });
            if let Some(e) = failure {
                publisher.close();
                return Err(e.into());
            }
            outcome.ticks += 1;
            outcome.records += self.turbines.len() as u64;
        }

        outcome.cancelled = cancel.is_cancelled() && self.clock.elapsed_ticks() < self.clock.total_ticks();
        if outcome.cancelled {
            info!(ticks = outcome.ticks, "run cancelled");
        } else {
            info!(ticks = outcome.ticks, records = outcome.records, "run finished");
        }
        publisher.close();
        Ok(outcome)
    }

    fn log_start(&self) {
        info!(
            scenario = self.spec.scenario.name(),
            turbines = self.turbines.len(),
            step_s = self.clock.step_s(),
            ticks = self.clock.total_ticks(),
            "run started"
        );
    }

    fn step(&mut self, tick: Tick, mut emit: impl FnMut(TelemetryRecord)) {
        let t = tick.time_s;
        let mut degraded = false;

        let grid = self
            .spec
            .grid_condition(t, self.grid_code.nominal_frequency_hz);
        let grid = match grid.validate() {
            Ok(()) => {
                self.last_grid = grid;
                grid
            }
            Err(e) => {
                warn!(time_s = t, error = %e, "substituting last good grid condition");
                degraded = true;
                self.last_grid
            }
        };

        let wind = self.wind.wind_at(t);
        let wind = if wind.is_valid() {
            self.last_wind = wind;
            wind
        } else {
            warn!(time_s = t, speed_ms = wind.speed_ms, "substituting last good wind sample");
            degraded = true;
            self.last_wind
        };

        let voltage_band = self.grid_code.voltage_band(grid.voltage_pu);
        let ride_through = self.ride_through.observe(t, grid.voltage_pu, voltage_band);

        for (idx, turbine) in self.turbines.iter_mut().enumerate() {
            let plan = self
                .failure
                .as_ref()
                .filter(|(i, _)| *i == idx)
                .map(|(_, p)| p);
            turbine.advance(t, plan);

            let out = turbine.output(wind.speed_ms);
            let verdict = self
                .grid_code
                .verdict(&grid, out.available_kw, turbine.nominal_kw());
            let health = turbine.health();

            emit(TelemetryRecord {
                tick: tick.index,
                timestamp_s: t,
                turbine_id: turbine.id(),
                wind_speed_ms: wind.speed_ms,
                wind_direction_deg: wind.direction_deg,
                power_kw: verdict.permissible_kw,
                reactive_kvar: verdict.reactive_kvar,
                grid_voltage_pu: grid.voltage_pu,
                grid_frequency_hz: grid.frequency_hz,
                state: turbine.state(),
                flags: ComplianceFlags {
                    lvrt_active: verdict.lvrt_active(),
                    hvrt_active: verdict.hvrt_active(),
                    ride_through_ok: ride_through.ok,
                    frequency_band: verdict.frequency_band,
                    degraded,
                },
                progress: turbine.progress(),
                vibration_mm_s: health.vibration_mm_s,
                bearing_temp_c: health.bearing_temp_c,
                rotor_rpm: out.rotor_rpm,
                blade_pitch_deg: out.blade_pitch_deg,
            });
        }
    }

    pub fn spec(&self) -> &ScenarioSpec {
        &self.spec
    }

    pub fn turbines(&self) -> &[TurbineUnit] {
        &self.turbines
    }

    pub fn grid_code(&self) -> &GridCode {
        &self.grid_code
    }

    /// Effective step size (s).
    pub fn step_s(&self) -> f64 {
        self.clock.step_s()
    }

    /// Ticks left before the run length is reached.
    pub fn remaining_ticks(&self) -> u64 {
        self.clock.total_ticks() - self.clock.elapsed_ticks()
    }
}
