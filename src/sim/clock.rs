use crate::error::{Result, SimError};

/// One advance of the simulated clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Zero-based tick index.
    pub index: u64,
    /// Simulated time at this tick (s).
    pub time_s: f64,
}

/// A simulation clock that advances in fixed steps for a fixed number of ticks.
///
/// Time is kept as an integer number of microseconds so that decimal step
/// sizes such as 0.1 s land on exact timestamps and never accumulate
/// rounding error.
///
/// # Examples
///
/// ```
/// use windgrid_sim::sim::clock::SimClock;
///
/// let mut clock = SimClock::new(0.5, 3).unwrap();
/// let mut times = Vec::new();
///
/// clock.run(|tick| times.push(tick.time_s));
/// assert_eq!(times, vec![0.0, 0.5, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Step size in microseconds
    step_us: u64,
    /// Next tick index
    current: u64,
    /// Total ticks to run
    total: u64,
}

impl SimClock {
    /// Smallest supported step (s).
    pub const MIN_STEP_S: f64 = 1e-6;

    /// Creates a clock.
    ///
    /// # Arguments
    ///
    /// * `step_s` - Step size in seconds, rounded to the nearest microsecond
    /// * `total` - Number of ticks the clock will produce
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidScenario` if `step_s` is not finite or is
    /// below one microsecond.
    pub fn new(step_s: f64, total: u64) -> Result<Self> {
        if !step_s.is_finite() || step_s < Self::MIN_STEP_S {
            return Err(SimError::InvalidScenario {
                field: "step_s",
                message: format!("must be at least 1 µs, got {step_s}"),
            });
        }
        Ok(Self {
            step_us: (step_s * 1e6).round() as u64,
            current: 0,
            total,
        })
    }

    /// Step size in seconds after rounding.
    pub fn step_s(&self) -> f64 {
        self.step_us as f64 / 1e6
    }

    pub fn total_ticks(&self) -> u64 {
        self.total
    }

    /// Ticks produced so far.
    pub fn elapsed_ticks(&self) -> u64 {
        self.current
    }

    /// Simulated time of tick `index` (s).
    pub fn time_of(&self, index: u64) -> f64 {
        (index * self.step_us) as f64 / 1e6
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The tick just reached
    /// * `None` - If the clock has produced all its ticks
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current < self.total {
            let index = self.current;
            self.current += 1;
            Some(Tick {
                index,
                time_s: self.time_of(index),
            })
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}
