//! Wind speed to active power mapping.

use crate::curve::{Bracket, PiecewiseLinear};
use crate::error::{CurveDefect, Result};

/// Wind speed (m/s) at which the reference curve starts dropping to zero.
pub const CUT_OUT_SPEED_MS: f64 = 25.0;

/// Width of the cut-out drop on the reference curve (m/s).
const CUT_OUT_RAMP_MS: f64 = 0.5;

/// Reference curve breakpoints as fractions of nominal power.
const REFERENCE_POINTS: [(f64, f64); 18] = [
    (0.0, 0.0),
    (3.0, 0.0),
    (4.0, 0.03),
    (5.0, 0.08),
    (6.0, 0.15),
    (7.0, 0.23),
    (8.0, 0.33),
    (9.0, 0.44),
    (10.0, 0.56),
    (11.0, 0.67),
    (12.0, 0.77),
    (13.0, 0.87),
    (14.0, 0.93),
    (15.0, 0.97),
    (16.0, 0.98),
    (17.0, 1.0),
    (CUT_OUT_SPEED_MS, 1.0),
    (CUT_OUT_SPEED_MS + CUT_OUT_RAMP_MS, 0.0),
];

/// A turbine power curve: wind speed (m/s) to active power (kW).
///
/// Wind speeds below the first breakpoint produce no power; wind speeds past
/// the last breakpoint produce the terminal value, so a curve ending in a zero
/// point models cut-out without special casing.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCurve {
    table: PiecewiseLinear,
}

impl PowerCurve {
    /// Builds a curve from `(wind_speed_ms, power_kw)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCurve` if the curve has fewer than two
    /// points, wind speeds are not strictly increasing, or any value is
    /// negative or not finite.
    pub fn new(points: &[(f64, f64)]) -> Result<Self> {
        for (index, &(ws, kw)) in points.iter().enumerate() {
            if ws < 0.0 || kw < 0.0 {
                return Err(CurveDefect::InvalidValue { index }.into());
            }
        }
        let table = PiecewiseLinear::new(points)?;
        Ok(Self { table })
    }

    /// Typical three-bladed utility turbine curve scaled to `nominal_kw`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCurve` if `nominal_kw` is negative or not
    /// finite.
    pub fn reference(nominal_kw: f64) -> Result<Self> {
        let points: Vec<(f64, f64)> = REFERENCE_POINTS
            .iter()
            .map(|&(ws, frac)| (ws, frac * nominal_kw))
            .collect();
        Self::new(&points)
    }

    /// Active power in kW at `wind_speed_ms`.
    pub fn power_kw(&self, wind_speed_ms: f64) -> f64 {
        match self.table.bracket(wind_speed_ms) {
            Bracket::Below => 0.0,
            Bracket::Within(i) => self.table.lerp_segment(i, wind_speed_ms),
            Bracket::Above => self.table.last_y(),
        }
    }

    /// Highest power on the curve (kW).
    pub fn rated_power_kw(&self) -> f64 {
        self.table.max_y()
    }

    /// Lowest wind speed at which the curve reaches its rated power.
    pub fn rated_wind_speed_ms(&self) -> f64 {
        let rated = self.rated_power_kw();
        self.table
            .points()
            .find(|&(_, kw)| kw >= rated)
            .map_or(self.table.last_x(), |(ws, _)| ws)
    }

    /// Breakpoints as `(wind_speed_ms, power_kw)`.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.table.points()
    }
}
