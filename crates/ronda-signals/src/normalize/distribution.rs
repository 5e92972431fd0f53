//! Winsorized sector distribution and piecewise-linear percentile lookup.

use ronda_traits::stats::{MIN_SPREAD_THRESHOLD, quantile_sorted, winsorize};
use serde::{Deserialize, Serialize};

/// Percentile breakpoints of one metric over one sector on one date.
///
/// Built from finite values only, after clipping at the configured lower and
/// upper quantiles. A value is mapped to a percentile by linear interpolation
/// between the breakpoints `(min, 0), (p10, 10), (p25, 25), (p50, 50),
/// (p75, 75), (p90, 90), (max, 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorDistribution {
    /// Smallest value after winsorizing.
    pub min: f64,
    /// 10th percentile.
    pub p10: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
    /// Largest value after winsorizing.
    pub max: f64,
    /// Finite observations the breakpoints were computed from.
    pub sample_count: usize,
}

impl SectorDistribution {
    /// Build a distribution from raw sector values.
    ///
    /// Non-finite values are excluded. Returns `None` when no finite value
    /// remains.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_signals::normalize::SectorDistribution;
    ///
    /// let values: Vec<f64> = (1..=20).map(f64::from).collect();
    /// let dist = SectorDistribution::from_values(&values, 0.01, 0.99).unwrap();
    ///
    /// assert_eq!(dist.sample_count, 20);
    /// assert!((dist.p50 - 10.5).abs() < 1e-12);
    /// ```
    pub fn from_values(values: &[f64], winsor_lower: f64, winsor_upper: f64) -> Option<Self> {
        let clipped = winsorize(values, winsor_lower, winsor_upper);
        let q = |p: f64| quantile_sorted(&clipped, p);

        Some(Self {
            min: q(0.0)?,
            p10: q(0.10)?,
            p25: q(0.25)?,
            p50: q(0.50)?,
            p75: q(0.75)?,
            p90: q(0.90)?,
            max: q(1.0)?,
            sample_count: clipped.len(),
        })
    }

    /// Breakpoints as `(value, percentile)` pairs, ascending.
    #[must_use]
    pub const fn breakpoints(&self) -> [(f64, f64); 7] {
        [
            (self.min, 0.0),
            (self.p10, 10.0),
            (self.p25, 25.0),
            (self.p50, 50.0),
            (self.p75, 75.0),
            (self.p90, 90.0),
            (self.max, 100.0),
        ]
    }

    /// Percentile of `value` within the distribution, before direction
    /// adjustment.
    ///
    /// Values at or below the minimum map to 0 and values at or above the
    /// maximum map to 100. A degenerate distribution (every value equal) maps
    /// everything to 50. Returns `None` for a non-finite value.
    #[must_use]
    pub fn percentile(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        if self.max - self.min < MIN_SPREAD_THRESHOLD {
            return Some(50.0);
        }
        if value <= self.min {
            return Some(0.0);
        }
        if value >= self.max {
            return Some(100.0);
        }

        let points = self.breakpoints();
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if value <= x1 && x1 - x0 > MIN_SPREAD_THRESHOLD {
                let p = y0 + (value - x0) / (x1 - x0) * (y1 - y0);
                return Some(p.clamp(0.0, 100.0));
            }
        }

        Some(100.0)
    }
}
