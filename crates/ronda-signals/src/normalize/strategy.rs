//! Ranking strategies: the single place where sector-relative ranking and the
//! absolute-benchmark fallback diverge.

use std::fmt;

use ronda_traits::{BenchmarkCurve, Metric, ScoringMethod};

use super::SectorDistribution;

/// Maps a raw metric value to a 0-100 score before direction adjustment.
///
/// One strategy is selected per (sector, metric) when a run's statistics are
/// built. Calculators only ever see the resulting percentile and method tag.
pub trait RankingStrategy: fmt::Debug + Send + Sync {
    /// Method tag recorded in factor metadata.
    fn method(&self) -> ScoringMethod;

    /// Finite sector observations available when the strategy was selected.
    fn sample_count(&self) -> usize;

    /// Score `value`, `None` if it is not finite.
    fn score(&self, value: f64) -> Option<f64>;

    /// The sector distribution behind the strategy, if any.
    fn distribution(&self) -> Option<&SectorDistribution> {
        None
    }
}

/// Percentile within the sector's winsorized distribution.
#[derive(Debug, Clone, Copy)]
pub struct SectorRelative {
    distribution: SectorDistribution,
}

impl SectorRelative {
    /// Wrap a distribution.
    #[must_use]
    pub const fn new(distribution: SectorDistribution) -> Self {
        Self { distribution }
    }
}

impl RankingStrategy for SectorRelative {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::SectorRelative
    }

    fn sample_count(&self) -> usize {
        self.distribution.sample_count
    }

    fn score(&self, value: f64) -> Option<f64> {
        self.distribution.percentile(value)
    }

    fn distribution(&self) -> Option<&SectorDistribution> {
        Some(&self.distribution)
    }
}

/// Fixed benchmark curve used when the sector sample is too small to rank.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteBenchmark {
    curve: BenchmarkCurve,
    sample_count: usize,
}

impl AbsoluteBenchmark {
    /// Create a fallback strategy for a sector with `sample_count` observations.
    #[must_use]
    pub const fn new(curve: BenchmarkCurve, sample_count: usize) -> Self {
        Self {
            curve,
            sample_count,
        }
    }

    /// The curve in use.
    #[must_use]
    pub const fn curve(&self) -> BenchmarkCurve {
        self.curve
    }
}

impl RankingStrategy for AbsoluteBenchmark {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::AbsoluteBenchmark
    }

    fn sample_count(&self) -> usize {
        self.sample_count
    }

    fn score(&self, value: f64) -> Option<f64> {
        value.is_finite().then(|| self.curve.score(value))
    }
}

/// Flip a raw-high score so that higher always means better for `metric`.
#[must_use]
pub fn direction_adjusted(metric: Metric, score: f64) -> f64 {
    let score = score.clamp(0.0, 100.0);
    if metric.lower_is_better() {
        100.0 - score
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_adjusted() {
        assert_relative_eq!(direction_adjusted(Metric::PriceToEarnings, 80.0), 20.0);
        assert_relative_eq!(direction_adjusted(Metric::ReturnOnEquity, 80.0), 80.0);
        assert_relative_eq!(direction_adjusted(Metric::DebtToEquity, 0.0), 100.0);
    }

    #[test]
    fn test_benchmark_strategy() {
        let s = AbsoluteBenchmark::new(BenchmarkCurve::new(15.0, 2.0), 3);
        assert_eq!(s.method(), ScoringMethod::AbsoluteBenchmark);
        assert_eq!(s.sample_count(), 3);
        assert_relative_eq!(s.score(25.0).unwrap(), 70.0);
        assert!(s.score(f64::NAN).is_none());
        assert!(s.distribution().is_none());
    }

    #[test]
    fn test_sector_strategy() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        let dist = SectorDistribution::from_values(&values, 0.01, 0.99).unwrap();
        let s = SectorRelative::new(dist);
        assert_eq!(s.method(), ScoringMethod::SectorRelative);
        assert_eq!(s.sample_count(), 20);
        assert!(s.distribution().is_some());
        assert_relative_eq!(s.score(10.5).unwrap(), 50.0, epsilon = 1e-9);
    }
}
