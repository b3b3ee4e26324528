//! Grid-code control laws: LVRT/HVRT active power limits, dynamic reactive
//! power support and frequency band classification.
//!
//! Every function here is stateless and evaluated once per tick. Duration
//! tracking lives in [`super::ride_through`].

use serde::{Deserialize, Serialize};

use super::condition::GridCondition;
use crate::error::Result;

/// Grid-code thresholds.
///
/// Defaults follow a typical 50 Hz transmission code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridCode {
    /// Voltage at or below which LVRT is active (pu).
    pub lvrt_floor_pu: f64,
    /// Voltage at which permissible active power reaches zero (pu).
    pub lvrt_v_min_pu: f64,
    /// Voltage at or above which HVRT is active (pu).
    pub hvrt_threshold_pu: f64,
    /// Reactive support cap as a fraction of nominal power.
    pub reactive_cap_nominal: f64,
    /// Reactive support cap as a fraction of active power.
    pub reactive_cap_active: f64,
    /// Power factor held inside the normal voltage band.
    pub power_factor: f64,
    /// Nominal grid frequency (Hz).
    pub nominal_frequency_hz: f64,
    /// Continuous operation band (Hz).
    pub continuous_band_hz: (f64, f64),
    /// Time-limited operation band (Hz).
    pub temporary_band_hz: (f64, f64),
}

impl Default for GridCode {
    fn default() -> Self {
        Self {
            lvrt_floor_pu: 0.9,
            lvrt_v_min_pu: 0.05,
            hvrt_threshold_pu: 1.1,
            reactive_cap_nominal: 0.4,
            reactive_cap_active: 0.5,
            power_factor: 0.95,
            nominal_frequency_hz: 50.0,
            continuous_band_hz: (49.0, 51.0),
            temporary_band_hz: (47.5, 51.5),
        }
    }
}

/// Voltage classification shared by every compliance flag.
///
/// The thresholds themselves belong to the outer bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoltageBand {
    Low,
    Normal,
    High,
}

/// Frequency classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBand {
    Continuous,
    Temporary,
    OutOfBounds,
}

impl FrequencyBand {
    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyBand::Continuous => "continuous",
            FrequencyBand::Temporary => "temporary",
            FrequencyBand::OutOfBounds => "out_of_bounds",
        }
    }
}

/// Result of evaluating one turbine against one grid condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceVerdict {
    /// Active power allowed onto the grid (kW).
    pub permissible_kw: f64,
    /// Reactive power setpoint (kvar); positive is inductive support.
    pub reactive_kvar: f64,
    pub voltage_band: VoltageBand,
    pub frequency_band: FrequencyBand,
}

impl ComplianceVerdict {
    pub fn lvrt_active(&self) -> bool {
        self.voltage_band == VoltageBand::Low
    }

    pub fn hvrt_active(&self) -> bool {
        self.voltage_band == VoltageBand::High
    }
}

impl GridCode {
    /// Classifies a voltage into the LVRT, normal or HVRT band.
    pub fn voltage_band(&self, voltage_pu: f64) -> VoltageBand {
        if voltage_pu <= self.lvrt_floor_pu {
            VoltageBand::Low
        } else if voltage_pu >= self.hvrt_threshold_pu {
            VoltageBand::High
        } else {
            VoltageBand::Normal
        }
    }

    /// Classifies a frequency against the continuous and temporary bands.
    pub fn frequency_band(&self, frequency_hz: f64) -> FrequencyBand {
        let within = |(lo, hi): (f64, f64)| (lo..=hi).contains(&frequency_hz);
        if within(self.continuous_band_hz) {
            FrequencyBand::Continuous
        } else if within(self.temporary_band_hz) {
            FrequencyBand::Temporary
        } else {
            FrequencyBand::OutOfBounds
        }
    }

    /// Active power permitted during a voltage dip.
    ///
    /// Below the LVRT floor the requested power is scaled linearly between
    /// `lvrt_v_min_pu` (zero) and the floor (full). The result is clamped to
    /// `[0, requested]` and is non-decreasing in voltage.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGridCondition` if `voltage_pu` is not a
    /// positive finite number.
    pub fn lvrt_permissible_power(&self, voltage_pu: f64, requested_kw: f64) -> Result<f64> {
        self.at_nominal_frequency(voltage_pu).validate()?;
        Ok(self.lvrt_scale(voltage_pu, requested_kw))
    }

    /// Reactive power target for the given voltage.
    ///
    /// Inside the LVRT band the turbine injects inductive support capped by
    /// both nominal and active power; inside the HVRT band the same
    /// magnitude is absorbed; otherwise the configured power factor is held.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGridCondition` if `voltage_pu` is not a
    /// positive finite number.
    pub fn dynamic_reactive_power(
        &self,
        active_kw: f64,
        voltage_pu: f64,
        nominal_kw: f64,
    ) -> Result<f64> {
        self.at_nominal_frequency(voltage_pu).validate()?;
        Ok(self.reactive_for_band(self.voltage_band(voltage_pu), active_kw, nominal_kw))
    }

    /// Full verdict for one turbine at one grid condition.
    ///
    /// # Arguments
    ///
    /// * `condition` - Grid condition for this tick
    /// * `available_kw` - Power the turbine could deliver from the wind
    /// * `nominal_kw` - Turbine rating
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGridCondition` for a non-physical condition.
    pub fn evaluate(
        &self,
        condition: &GridCondition,
        available_kw: f64,
        nominal_kw: f64,
    ) -> Result<ComplianceVerdict> {
        condition.validate()?;
        Ok(self.verdict(condition, available_kw, nominal_kw))
    }

    /// Same as [`Self::evaluate`] for a condition the caller has already
    /// validated.
    pub fn verdict(
        &self,
        condition: &GridCondition,
        available_kw: f64,
        nominal_kw: f64,
    ) -> ComplianceVerdict {
        let requested = available_kw.clamp(0.0, nominal_kw.max(0.0));
        let voltage_band = self.voltage_band(condition.voltage_pu);
        ComplianceVerdict {
            permissible_kw: self.lvrt_scale(condition.voltage_pu, requested),
            reactive_kvar: self.reactive_for_band(voltage_band, requested, nominal_kw),
            voltage_band,
            frequency_band: self.frequency_band(condition.frequency_hz),
        }
    }

    fn at_nominal_frequency(&self, voltage_pu: f64) -> GridCondition {
        GridCondition {
            voltage_pu,
            frequency_hz: self.nominal_frequency_hz,
        }
    }

    fn lvrt_scale(&self, voltage_pu: f64, requested_kw: f64) -> f64 {
        let requested = requested_kw.max(0.0);
        if voltage_pu >= self.lvrt_floor_pu {
            return requested;
        }
        let span = self.lvrt_floor_pu - self.lvrt_v_min_pu;
        let frac = (voltage_pu - self.lvrt_v_min_pu) / span;
        (requested * frac).clamp(0.0, requested)
    }

    fn reactive_for_band(&self, band: VoltageBand, active_kw: f64, nominal_kw: f64) -> f64 {
        let support = || {
            (self.reactive_cap_nominal * nominal_kw).min(self.reactive_cap_active * active_kw)
        };
        match band {
            VoltageBand::Low => support(),
            VoltageBand::High => -support(),
            VoltageBand::Normal => active_kw * self.power_factor.acos().tan(),
        }
    }
}
