//! Wind inputs: constant, historical series and seeded stochastic patterns.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::curve::PiecewiseLinear;
use crate::error::{CurveDefect, Result};

/// Wind at hub height for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindSample {
    /// Speed (m/s).
    pub speed_ms: f64,
    /// Direction the wind comes from (degrees from north).
    pub direction_deg: f64,
}

impl WindSample {
    /// `true` when the speed is a non-negative finite number and the
    /// direction is finite.
    pub fn is_valid(&self) -> bool {
        self.speed_ms.is_finite() && self.speed_ms >= 0.0 && self.direction_deg.is_finite()
    }
}

/// Source of wind samples keyed by simulated time.
///
/// The engine calls `wind_at` exactly once per tick with strictly
/// increasing timestamps, so stateful feeds stay reproducible.
pub trait WindFeed {
    fn wind_at(&mut self, time_s: f64) -> WindSample;
}

/// The same wind for every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWind {
    pub speed_ms: f64,
    pub direction_deg: f64,
}

impl WindFeed for ConstantWind {
    fn wind_at(&mut self, _time_s: f64) -> WindSample {
        WindSample {
            speed_ms: self.speed_ms,
            direction_deg: self.direction_deg,
        }
    }
}

/// Historical wind speeds, linearly interpolated between samples and held
/// flat outside the recorded window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSeries {
    speed: PiecewiseLinear,
    direction_deg: f64,
}

impl WindSeries {
    /// Builds a series from `(time_s, speed_ms)` samples.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCurve` if fewer than two samples are given,
    /// timestamps are not strictly increasing, or a speed is negative or not
    /// finite.
    pub fn new(samples: &[(f64, f64)], direction_deg: f64) -> Result<Self> {
        if let Some(index) = samples.iter().position(|&(_, v)| v < 0.0) {
            return Err(CurveDefect::InvalidValue { index }.into());
        }
        Ok(Self {
            speed: PiecewiseLinear::new(samples)?,
            direction_deg,
        })
    }
}

impl WindFeed for WindSeries {
    fn wind_at(&mut self, time_s: f64) -> WindSample {
        WindSample {
            speed_ms: self.speed.interpolate_clamped(time_s),
            direction_deg: self.direction_deg,
        }
    }
}

/// Shape of a synthetic wind profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindPattern {
    /// Flat around the base speed.
    Steady,
    /// `+2 m/s · sin(π·hour/12)` around the base speed.
    Diurnal,
    /// Rises by 0.1 m/s per sample interval.
    Increasing,
    /// `+3 m/s · sin(0.1·interval)` oscillation.
    Gusty,
}

/// Seeded stochastic wind: a deterministic pattern plus Gaussian noise.
#[derive(Debug, Clone)]
pub struct PatternWind {
    pattern: WindPattern,
    base_speed_ms: f64,
    noise_std_ms: f64,
    direction_deg: f64,
    interval_s: f64,
    rng: StdRng,
}

impl PatternWind {
    /// Creates a pattern feed.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Profile shape
    /// * `base_speed_ms` - Mean wind speed (m/s)
    /// * `noise_std_ms` - Standard deviation of the per-tick noise (m/s)
    /// * `direction_deg` - Mean wind direction
    /// * `interval_s` - Length of one pattern sample interval (s)
    /// * `seed` - Random seed for reproducible noise
    pub fn new(
        pattern: WindPattern,
        base_speed_ms: f64,
        noise_std_ms: f64,
        direction_deg: f64,
        interval_s: f64,
        seed: u64,
    ) -> Self {
        Self {
            pattern,
            base_speed_ms: base_speed_ms.max(0.0),
            noise_std_ms: noise_std_ms.max(0.0),
            direction_deg,
            interval_s: if interval_s > 0.0 { interval_s } else { 600.0 },
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn mean_speed_ms(&self, time_s: f64) -> f64 {
        let i = time_s / self.interval_s;
        match self.pattern {
            WindPattern::Steady => self.base_speed_ms,
            WindPattern::Diurnal => {
                let hour = (time_s / 3600.0) % 24.0;
                self.base_speed_ms + 2.0 * (PI * hour / 12.0).sin()
            }
            WindPattern::Increasing => self.base_speed_ms + 0.1 * i,
            WindPattern::Gusty => self.base_speed_ms + 3.0 * (0.1 * i).sin(),
        }
    }
}

impl WindFeed for PatternWind {
    fn wind_at(&mut self, time_s: f64) -> WindSample {
        let speed = self.mean_speed_ms(time_s) + gaussian_noise(&mut self.rng, self.noise_std_ms);
        let veer = gaussian_noise(&mut self.rng, 5.0);
        WindSample {
            speed_ms: speed.max(0.0),
            direction_deg: (self.direction_deg + veer).rem_euclid(360.0),
        }
    }
}

/// Closed set of wind feeds selectable from configuration.
#[derive(Debug, Clone)]
pub enum WindModel {
    Constant(ConstantWind),
    Series(WindSeries),
    Pattern(PatternWind),
}

impl WindFeed for WindModel {
    fn wind_at(&mut self, time_s: f64) -> WindSample {
        match self {
            WindModel::Constant(w) => w.wind_at(time_s),
            WindModel::Series(w) => w.wind_at(time_s),
            WindModel::Pattern(w) => w.wind_at(time_s),
        }
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// # Returns
///
/// A sample with mean 0 and the given standard deviation; 0 when
/// `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}
