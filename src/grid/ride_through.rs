//! Ride-through duration limits and excursion tracking.

use tracing::warn;

use super::compliance::VoltageBand;
use crate::curve::PiecewiseLinear;
use crate::error::Result;

/// LVRT voltage (pu) to maximum allowed duration (s).
const LVRT_CURVE: [(f64, f64); 5] = [(0.0, 0.15), (0.3, 0.15), (0.7, 0.7), (0.85, 1.5), (0.9, 3.0)];

/// HVRT voltage (pu) to maximum allowed duration (s).
const HVRT_CURVE: [(f64, f64); 3] = [(1.1, 60.0), (1.15, 1.0), (1.2, 0.1)];

/// Voltage/duration envelopes a turbine must stay connected through.
#[derive(Debug, Clone, PartialEq)]
pub struct RideThroughCurves {
    lvrt: PiecewiseLinear,
    hvrt: PiecewiseLinear,
}

impl RideThroughCurves {
    /// Builds envelopes from `(voltage_pu, max_duration_s)` points.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCurve` if either table is malformed.
    pub fn new(lvrt: &[(f64, f64)], hvrt: &[(f64, f64)]) -> Result<Self> {
        Ok(Self {
            lvrt: PiecewiseLinear::new(lvrt)?,
            hvrt: PiecewiseLinear::new(hvrt)?,
        })
    }

    /// Standard envelopes for a transmission-connected wind plant.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in tables; the `Result` mirrors [`Self::new`].
    pub fn reference() -> Result<Self> {
        Self::new(&LVRT_CURVE, &HVRT_CURVE)
    }

    /// Longest excursion tolerated at `voltage_pu` in the given band, or
    /// `None` inside the normal band.
    pub fn allowed_duration_s(&self, band: VoltageBand, voltage_pu: f64) -> Option<f64> {
        match band {
            VoltageBand::Low => Some(self.lvrt.interpolate_clamped(voltage_pu)),
            VoltageBand::High => Some(self.hvrt.interpolate_clamped(voltage_pu)),
            VoltageBand::Normal => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Excursion {
    band: VoltageBand,
    started_s: f64,
    violated: bool,
}

/// Tracks how long the grid has continuously stayed outside the normal band.
///
/// A violation sticks until the voltage returns to the normal band.
#[derive(Debug, Clone)]
pub struct RideThroughTracker {
    curves: RideThroughCurves,
    current: Option<Excursion>,
}

/// Ride-through state after observing one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideThroughStatus {
    /// Time spent continuously in the current band (s).
    pub excursion_s: f64,
    /// `false` once the excursion outlasted the envelope.
    pub ok: bool,
}

impl RideThroughTracker {
    pub fn new(curves: RideThroughCurves) -> Self {
        Self {
            curves,
            current: None,
        }
    }

    /// Records the grid voltage for a tick and reports compliance.
    ///
    /// Must be called with non-decreasing `time_s`.
    pub fn observe(&mut self, time_s: f64, voltage_pu: f64, band: VoltageBand) -> RideThroughStatus {
        let Some(allowed) = self.curves.allowed_duration_s(band, voltage_pu) else {
            self.current = None;
            return RideThroughStatus {
                excursion_s: 0.0,
                ok: true,
            };
        };

        if self.current.is_some_and(|e| e.band != band) {
            self.current = None;
        }
        let excursion = self.current.get_or_insert(Excursion {
            band,
            started_s: time_s,
            violated: false,
        });

        let elapsed = time_s - excursion.started_s;
        if !excursion.violated && elapsed > allowed {
            excursion.violated = true;
            warn!(
                band = ?band,
                voltage_pu,
                elapsed_s = elapsed,
                allowed_s = allowed,
                "ride-through envelope exceeded"
            );
        }

        RideThroughStatus {
            excursion_s: elapsed,
            ok: !excursion.violated,
        }
    }
}
