use serde::Serialize;

use crate::error::{Result, SimError};

/// Instantaneous grid state at the point of common coupling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCondition {
    /// Voltage in per-unit of nominal.
    pub voltage_pu: f64,
    /// Frequency (Hz).
    pub frequency_hz: f64,
}

impl GridCondition {
    /// Nominal voltage at the given frequency.
    pub fn nominal(frequency_hz: f64) -> Self {
        Self {
            voltage_pu: 1.0,
            frequency_hz,
        }
    }

    /// Checks that the condition is physical.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGridCondition` if voltage or frequency is
    /// not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        let physical = |x: f64| x.is_finite() && x > 0.0;
        if physical(self.voltage_pu) && physical(self.frequency_hz) {
            Ok(())
        } else {
            Err(SimError::InvalidGridCondition {
                voltage_pu: self.voltage_pu,
                frequency_hz: self.frequency_hz,
            })
        }
    }
}
