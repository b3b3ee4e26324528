//! Error taxonomy for setup and per-tick evaluation.

use thiserror::Error;

use crate::telemetry::pipeline::PipelineError;
use crate::turbine::TurbineId;

pub type Result<T> = std::result::Result<T, SimError>;

/// What is wrong with a rejected power curve or interpolation table.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CurveDefect {
    #[error("expected at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("x values must be strictly increasing (point {index})")]
    NotStrictlyIncreasing { index: usize },
    #[error("point {index} is negative or not finite")]
    InvalidValue { index: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid curve: {defect}")]
    InvalidCurve { defect: CurveDefect },
    #[error("non-physical grid condition: voltage={voltage_pu} pu, frequency={frequency_hz} Hz")]
    InvalidGridCondition { voltage_pu: f64, frequency_hz: f64 },
    #[error("invalid scenario: {field} {message}")]
    InvalidScenario { field: &'static str, message: String },
    #[error("turbine {0} is not part of the fleet")]
    UnknownTurbine(TurbineId),
    #[error("turbine {0} appears more than once in the fleet")]
    DuplicateTurbine(TurbineId),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<CurveDefect> for SimError {
    fn from(defect: CurveDefect) -> Self {
        Self::InvalidCurve { defect }
    }
}
