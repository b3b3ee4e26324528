//! Scenario definitions and their per-tick grid models.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::grid::GridCondition;
use crate::turbine::{FailurePlan, TurbineId};

/// Default step for normal operation and mechanical failure runs (s).
pub const COARSE_STEP_S: f64 = 1.0;
/// Default step for grid fault runs (s).
pub const FAULT_STEP_S: f64 = 0.1;
/// Default voltage recovery window after a fault clears (s).
pub const DEFAULT_RECOVERY_S: f64 = 5.0;

fn default_recovery_s() -> f64 {
    DEFAULT_RECOVERY_S
}

/// A voltage event at the point of common coupling.
///
/// A `voltage_floor_pu` below the LVRT floor models a dip; one above the
/// HVRT threshold models a swell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridFault {
    /// Time at which the fault starts (s).
    pub fault_start_s: f64,
    /// How long the fault voltage is held (s).
    pub fault_duration_s: f64,
    /// Voltage during the fault (pu).
    pub voltage_floor_pu: f64,
    /// Linear ramp back to nominal after the fault clears (s).
    #[serde(default = "default_recovery_s")]
    pub recovery_s: f64,
}

impl GridFault {
    /// Voltage at time `t`: nominal, then the fault voltage, then a linear
    /// ramp back to nominal.
    pub fn voltage_at(&self, t: f64) -> f64 {
        let cleared = self.fault_start_s + self.fault_duration_s;
        if t < self.fault_start_s {
            1.0
        } else if t < cleared {
            self.voltage_floor_pu
        } else if t < cleared + self.recovery_s {
            let frac = (t - cleared) / self.recovery_s;
            self.voltage_floor_pu + (1.0 - self.voltage_floor_pu) * frac
        } else {
            1.0
        }
    }

    fn validate(&self) -> Result<()> {
        non_negative("scenario.fault_start_s", self.fault_start_s)?;
        non_negative("scenario.fault_duration_s", self.fault_duration_s)?;
        non_negative("scenario.voltage_floor_pu", self.voltage_floor_pu)?;
        non_negative("scenario.recovery_s", self.recovery_s)
    }
}

/// Mechanical degradation ending in failure of one turbine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurbineFailure {
    pub turbine_id: TurbineId,
    /// Time at which the turbine fails (s).
    pub failure_time_s: f64,
    /// How long before failure the degradation starts (s).
    pub degradation_lead_s: f64,
}

impl TurbineFailure {
    pub fn plan(&self) -> FailurePlan {
        FailurePlan {
            failure_time_s: self.failure_time_s,
            degradation_lead_s: self.degradation_lead_s,
        }
    }

    fn validate(&self) -> Result<()> {
        non_negative("scenario.failure_time_s", self.failure_time_s)?;
        non_negative("scenario.degradation_lead_s", self.degradation_lead_s)
    }
}

/// The closed set of scenario classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scenario {
    /// Nominal grid, no failures.
    #[default]
    Normal,
    GridFault(GridFault),
    TurbineFailure(TurbineFailure),
}

impl Scenario {
    /// Step size used when the run does not override it.
    pub fn default_step_s(&self) -> f64 {
        match self {
            Scenario::Normal | Scenario::TurbineFailure(_) => COARSE_STEP_S,
            Scenario::GridFault(_) => FAULT_STEP_S,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::GridFault(_) => "grid_fault",
            Scenario::TurbineFailure(_) => "turbine_failure",
        }
    }
}

/// How long a run lasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLength {
    /// Ticks at every step strictly before this simulated time (s).
    Duration(f64),
    /// Exactly this many ticks.
    Ticks(u64),
}

/// Everything needed to drive one run. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioSpec {
    pub scenario: Scenario,
    /// Step override (s); `None` uses the scenario's default.
    pub step_s: Option<f64>,
    pub length: RunLength,
}

impl ScenarioSpec {
    pub fn new(scenario: Scenario, length: RunLength) -> Self {
        Self {
            scenario,
            step_s: None,
            length,
        }
    }

    /// Overrides the step size.
    pub fn with_step(mut self, step_s: f64) -> Self {
        self.step_s = Some(step_s);
        self
    }

    /// Effective step size (s).
    pub fn step_s(&self) -> f64 {
        self.step_s.unwrap_or_else(|| self.scenario.default_step_s())
    }

    /// Number of ticks the run will produce.
    pub fn total_ticks(&self) -> u64 {
        match self.length {
            RunLength::Ticks(n) => n,
            RunLength::Duration(seconds) => {
                let step_us = (self.step_s() * 1e6).round() as u64;
                let duration_us = (seconds * 1e6).round() as u64;
                if step_us == 0 {
                    0
                } else {
                    duration_us.div_ceil(step_us)
                }
            }
        }
    }

    /// Checks scenario parameters and run length.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidScenario` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let step = self.step_s();
        if !step.is_finite() || step <= 0.0 {
            return Err(SimError::InvalidScenario {
                field: "simulation.step_s",
                message: format!("must be > 0, got {step}"),
            });
        }
        if let RunLength::Duration(seconds) = self.length {
            non_negative("simulation.duration_s", seconds)?;
        }
        match &self.scenario {
            Scenario::Normal => Ok(()),
            Scenario::GridFault(fault) => fault.validate(),
            Scenario::TurbineFailure(failure) => failure.validate(),
        }
    }

    /// Grid condition produced by the scenario at time `t`.
    ///
    /// The result is not validated here; a fault model may produce a
    /// non-physical voltage that the engine must catch.
    pub fn grid_condition(&self, t: f64, nominal_frequency_hz: f64) -> GridCondition {
        match &self.scenario {
            Scenario::Normal | Scenario::TurbineFailure(_) => {
                GridCondition::nominal(nominal_frequency_hz)
            }
            Scenario::GridFault(fault) => GridCondition {
                voltage_pu: fault.voltage_at(t),
                frequency_hz: nominal_frequency_hz,
            },
        }
    }

    /// The turbine scheduled to fail, if any.
    pub fn failure(&self) -> Option<&TurbineFailure> {
        match &self.scenario {
            Scenario::TurbineFailure(f) => Some(f),
            _ => None,
        }
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidScenario {
            field,
            message: format!("must be a finite number >= 0, got {value}"),
        })
    }
}
