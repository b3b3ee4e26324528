//! Turbine models: power curve, rotor mechanics and lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wind speed to power interpolation.
pub mod curve;
/// Rotor speed and blade pitch schedules.
pub mod mechanics;
pub mod unit;

pub use curve::PowerCurve;
pub use unit::{FailurePlan, HealthSignals, TurbineOutput, TurbineState, TurbineUnit};

/// Identifier of a turbine within one fleet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TurbineId(pub u32);

impl fmt::Display for TurbineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WT{:02}", self.0)
    }
}
