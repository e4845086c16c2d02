//! Percentile clipping (winsorizing) for regression targets

use crate::error::{DietError, Result};
use serde::{Deserialize, Serialize};

/// Fitted bounds for a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ClipBounds {
    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Clips values to a percentile range learned from the same values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileClipper {
    lower: f64,
    upper: f64,
}

impl PercentileClipper {
    /// Create a clipper for the `[lower, upper]` quantile range, both in `0..=1`
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower > upper {
            return Err(DietError::ConfigError(format!(
                "Invalid clip percentiles: lower={}, upper={}",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Bounds for the given values, or `None` when there are none
    pub fn bounds(&self, values: &[f64]) -> Option<ClipBounds> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(ClipBounds {
            lower: quantile(&sorted, self.lower),
            upper: quantile(&sorted, self.upper),
        })
    }

    /// Clip values in place; returns the bounds that were applied
    pub fn clip_in_place(&self, values: &mut [f64]) -> Option<ClipBounds> {
        let bounds = self.bounds(values)?;
        for v in values.iter_mut() {
            *v = bounds.clip(*v);
        }
        Some(bounds)
    }
}

/// Quantile of sorted data with linear interpolation between order statistics
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
