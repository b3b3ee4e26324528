//! Per-turbine lifecycle and output modulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::TurbineId;
use super::curve::PowerCurve;
use super::mechanics::{blade_pitch_deg, rotor_speed_rpm};
use crate::error::{Result, SimError};

/// Fraction of output lost at the end of the degradation window.
const DEGRADATION_POWER_LOSS: f64 = 0.7;

/// Drivetrain vibration while healthy (mm/s RMS).
pub const VIBRATION_BASE_MM_S: f64 = 2.0;
/// Additional vibration at full degradation (mm/s RMS).
pub const VIBRATION_SPAN_MM_S: f64 = 8.0;
/// Vibration reported once the turbine has failed (mm/s RMS).
pub const VIBRATION_FAILED_MM_S: f64 = 15.0;

/// Main bearing temperature while healthy (°C).
pub const BEARING_BASE_C: f64 = 45.0;
/// Additional bearing temperature at full degradation (°C).
pub const BEARING_SPAN_C: f64 = 35.0;
/// Bearing temperature reported once the turbine has failed (°C).
pub const BEARING_FAILED_C: f64 = 95.0;

/// Lifecycle state of a turbine. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurbineState {
    Operational,
    Degrading,
    Failed,
}

impl TurbineState {
    /// Lowercase label used in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            TurbineState::Operational => "operational",
            TurbineState::Degrading => "degrading",
            TurbineState::Failed => "failed",
        }
    }
}

impl fmt::Display for TurbineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure schedule applied to one turbine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePlan {
    /// Simulated time at which the turbine fails (s).
    pub failure_time_s: f64,
    /// How long before the failure degradation becomes visible (s).
    pub degradation_lead_s: f64,
}

impl FailurePlan {
    /// Time at which the turbine enters `Degrading`.
    pub fn lead_start_s(&self) -> f64 {
        self.failure_time_s - self.degradation_lead_s
    }
}

/// Condition-monitoring signals derived from degradation progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthSignals {
    /// Drivetrain vibration (mm/s RMS).
    pub vibration_mm_s: f64,
    /// Main bearing temperature (°C).
    pub bearing_temp_c: f64,
}

/// Electrical and mechanical output of a turbine before grid-code limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurbineOutput {
    /// Active power the turbine can deliver (kW), within `[0, nominal]`.
    pub available_kw: f64,
    /// Rotor speed (rpm).
    pub rotor_rpm: f64,
    /// Blade pitch angle (degrees).
    pub blade_pitch_deg: f64,
}

/// A single wind turbine.
///
/// Owns its power curve. Mutated only through [`TurbineUnit::advance`],
/// which the engine calls exactly once per tick.
#[derive(Debug, Clone)]
pub struct TurbineUnit {
    id: TurbineId,
    curve: PowerCurve,
    nominal_kw: f64,
    state: TurbineState,
    progress: f64,
}

impl TurbineUnit {
    /// Creates an operational turbine.
    ///
    /// # Arguments
    ///
    /// * `id` - Fleet-unique identifier
    /// * `curve` - Power curve owned by this turbine
    /// * `nominal_kw` - Nameplate rating (kW), caps the curve output
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidScenario` if `nominal_kw` is not a positive
    /// finite number.
    pub fn new(id: TurbineId, curve: PowerCurve, nominal_kw: f64) -> Result<Self> {
        if !(nominal_kw.is_finite() && nominal_kw > 0.0) {
            return Err(SimError::InvalidScenario {
                field: "fleet.nominal_kw",
                message: format!("must be a positive number, got {nominal_kw}"),
            });
        }
        Ok(Self {
            id,
            curve,
            nominal_kw,
            state: TurbineState::Operational,
            progress: 0.0,
        })
    }

    pub fn id(&self) -> TurbineId {
        self.id
    }

    pub fn nominal_kw(&self) -> f64 {
        self.nominal_kw
    }

    pub fn state(&self) -> TurbineState {
        self.state
    }

    /// Degradation progress in `[0, 1]`; never decreases.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn curve(&self) -> &PowerCurve {
        &self.curve
    }

    /// Moves the lifecycle forward to simulated time `now_s`.
    ///
    /// Turbines without a plan stay in their current state. Returns the new
    /// state when a transition happened.
    pub fn advance(&mut self, now_s: f64, plan: Option<&FailurePlan>) -> Option<TurbineState> {
        let plan = plan?;
        if self.state == TurbineState::Failed {
            return None;
        }

        let before = self.state;
        let lead_start = plan.lead_start_s();
        if now_s >= plan.failure_time_s {
            self.state = TurbineState::Failed;
            self.progress = 1.0;
        } else if now_s >= lead_start {
            self.state = TurbineState::Degrading;
            let window = plan.failure_time_s - lead_start;
            let p = ((now_s - lead_start) / window).clamp(0.0, 1.0);
            self.progress = self.progress.max(p);
        }

        if self.state == before {
            return None;
        }
        info!(
            turbine = %self.id,
            from = %before,
            to = %self.state,
            time_s = now_s,
            "turbine state transition"
        );
        Some(self.state)
    }

    /// Output multiplier applied to the curve: `1 - 0.7 * progress` while
    /// degrading, 0 once failed.
    pub fn power_multiplier(&self) -> f64 {
        match self.state {
            TurbineState::Operational => 1.0,
            TurbineState::Degrading => 1.0 - DEGRADATION_POWER_LOSS * self.progress,
            TurbineState::Failed => 0.0,
        }
    }

    /// Power, rotor speed and pitch for the given wind speed.
    pub fn output(&self, wind_speed_ms: f64) -> TurbineOutput {
        if self.state == TurbineState::Failed {
            return TurbineOutput {
                available_kw: 0.0,
                rotor_rpm: 0.0,
                blade_pitch_deg: 0.0,
            };
        }
        let raw = self.curve.power_kw(wind_speed_ms) * self.power_multiplier();
        TurbineOutput {
            available_kw: raw.clamp(0.0, self.nominal_kw),
            rotor_rpm: rotor_speed_rpm(wind_speed_ms),
            blade_pitch_deg: blade_pitch_deg(wind_speed_ms),
        }
    }

    /// Current condition-monitoring signals.
    pub fn health(&self) -> HealthSignals {
        match self.state {
            TurbineState::Failed => HealthSignals {
                vibration_mm_s: VIBRATION_FAILED_MM_S,
                bearing_temp_c: BEARING_FAILED_C,
            },
            _ => HealthSignals {
                vibration_mm_s: VIBRATION_BASE_MM_S + VIBRATION_SPAN_MM_S * self.progress,
                bearing_temp_c: BEARING_BASE_C + BEARING_SPAN_C * self.progress,
            },
        }
    }
}
