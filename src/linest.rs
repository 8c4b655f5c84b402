use log::warn;
use num_traits::Float;
use serde::Serialize;

use crate::observation::Observation;

/// Centered second moments of a set of observations.
///
/// Built in two passes (means first, then deviations) which keeps the sums
/// well conditioned when the data sits far from the origin.
#[derive(Clone, Copy, Default, Debug)]
pub struct Linest {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
    n: usize,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct LinestResult {
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
}

impl Linest {
    pub fn from_observations(observations: &[Observation]) -> Self {
        let n = observations.len();
        if n == 0 {
            return Self::default();
        }
        let len = n as f64;
        let (x_sum, y_sum) = observations
            .iter()
            .fold((0.0, 0.0), |(sx, sy), o| (sx + o.x(), sy + o.y()));
        let mean_x = x_sum / len;
        let mean_y = y_sum / len;

        let mut res = Self {
            mean_x,
            mean_y,
            n,
            ..Self::default()
        };
        for o in observations {
            let dx = o.x() - mean_x;
            let dy = o.y() - mean_y;
            res.sxx += dx * dx;
            res.syy += dy * dy;
            res.sxy += dx * dy;
        }
        res
    }

    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    pub fn mean_y(&self) -> f64 {
        self.mean_y
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Sample standard deviations of x and y and the sample covariance.
    pub fn sample_moments(&self) -> (f64, f64, f64) {
        let dof = self.n.saturating_sub(1) as f64;
        (
            (self.sxx / dof).sqrt(),
            (self.syy / dof).sqrt(),
            self.sxy / dof,
        )
    }

    /// Fits `y = slope * x + intercept`.
    ///
    /// Non-finite coefficients (zero variance in x or y, fewer than two
    /// observations, non-finite input) are replaced by zero one at a time.
    /// The slope is derived from the sanitized correlation, so zero variance
    /// in y gives a horizontal line through the means. Zero variance in x
    /// leaves the slope undefined and then the intercept is zero as well.
    pub fn estimate(&self) -> LinestResult {
        let (sx, sy, sxy) = self.sample_moments();
        let correlation = finite_or_zero("correlation", sxy / (sx * sy));
        let raw_slope = correlation * sy / sx;
        let slope = finite_or_zero("slope", raw_slope);
        let intercept = if raw_slope.is_finite() {
            finite_or_zero("intercept", self.mean_y - slope * self.mean_x)
        } else {
            0.0
        };
        LinestResult {
            slope,
            intercept,
            correlation,
        }
    }
}

/// Returns `value` when finite, zero otherwise.
pub fn finite_or_zero<F: Float>(what: &str, value: F) -> F {
    if value.is_finite() {
        value
    } else {
        warn!("{} is not finite, replaced by zero", what);
        F::zero()
    }
}
