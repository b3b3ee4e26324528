//! Piecewise-linear lookup tables shared by power curves, ride-through
//! limits and historical wind series.

use crate::error::CurveDefect;

/// Position of a query relative to the table's breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// Strictly before the first breakpoint.
    Below,
    /// Inside segment `i`, i.e. `xs[i] <= x < xs[i + 1]`.
    Within(usize),
    /// At or beyond the last breakpoint.
    Above,
}

/// Immutable table of `(x, y)` breakpoints with strictly increasing `x`.
///
/// Lookups are a binary search followed by a linear interpolation and never
/// allocate.
///
/// # Examples
///
/// ```
/// use windgrid_sim::curve::PiecewiseLinear;
///
/// let table = PiecewiseLinear::new(&[(0.0, 0.0), (10.0, 100.0)]).unwrap();
/// assert_eq!(table.interpolate_clamped(5.0), 50.0);
/// assert_eq!(table.interpolate_clamped(-1.0), 0.0);
/// assert_eq!(table.interpolate_clamped(99.0), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl PiecewiseLinear {
    /// Builds a table from breakpoints.
    ///
    /// # Errors
    ///
    /// Returns a [`CurveDefect`] when fewer than two points are given, when
    /// any coordinate is not finite, or when `x` is not strictly increasing.
    pub fn new(points: &[(f64, f64)]) -> Result<Self, CurveDefect> {
        if points.len() < 2 {
            return Err(CurveDefect::TooFewPoints(points.len()));
        }
        for (index, &(x, y)) in points.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(CurveDefect::InvalidValue { index });
            }
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(CurveDefect::NotStrictlyIncreasing { index: index + 1 });
            }
        }

        Ok(Self {
            xs: points.iter().map(|&(x, _)| x).collect(),
            ys: points.iter().map(|&(_, y)| y).collect(),
        })
    }

    /// Locates `x` among the breakpoints. `NaN` is reported as [`Bracket::Below`].
    pub fn bracket(&self, x: f64) -> Bracket {
        let idx = self.xs.partition_point(|&bp| bp <= x);
        if idx == 0 {
            Bracket::Below
        } else if idx == self.xs.len() {
            Bracket::Above
        } else {
            Bracket::Within(idx - 1)
        }
    }

    /// Interpolates inside segment `i`.
    ///
    /// The result is clamped to the segment's `y` range so rounding can never
    /// break monotonicity across a breakpoint.
    pub fn lerp_segment(&self, i: usize, x: f64) -> f64 {
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let y = y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        y.clamp(y0.min(y1), y0.max(y1))
    }

    /// Interpolates with flat extrapolation on both ends.
    pub fn interpolate_clamped(&self, x: f64) -> f64 {
        match self.bracket(x) {
            Bracket::Below => self.ys[0],
            Bracket::Within(i) => self.lerp_segment(i, x),
            Bracket::Above => self.last_y(),
        }
    }

    /// First breakpoint `x`.
    pub fn first_x(&self) -> f64 {
        self.xs[0]
    }

    /// Last breakpoint `x`.
    pub fn last_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Value at the last breakpoint.
    pub fn last_y(&self) -> f64 {
        self.ys[self.ys.len() - 1]
    }

    /// Largest `y` in the table.
    pub fn max_y(&self) -> f64 {
        self.ys.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Iterates over the breakpoints in order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always `false`; a table holds at least two points.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}
