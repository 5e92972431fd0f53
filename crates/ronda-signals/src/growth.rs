//! Growth factor based on year-over-year revenue and EPS growth.
//!
//! Growth compares the latest quarter with the same quarter a year earlier
//! using `(current - prior) / |prior| * 100`. A move from a loss to a profit
//! is therefore strong positive growth, which keeps turnarounds from being
//! punished for the sign of their prior-year earnings.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the growth factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Weight of revenue growth (default: 0.5)
    pub revenue_weight: f64,

    /// Weight of EPS growth (default: 0.5)
    pub eps_weight: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            revenue_weight: 0.5,
            eps_weight: 0.5,
        }
    }
}

/// Growth factor calculator.
///
/// Needs at least five quarters of a series for that sub-metric to exist; a
/// zero prior-year value leaves it undefined. The factor is omitted only when
/// both revenue and EPS growth are missing.
#[derive(Debug, Clone, Default)]
pub struct GrowthFactor {
    config: GrowthConfig,
}

impl GrowthFactor {
    const METRICS: [Metric; 2] = [Metric::RevenueGrowth, Metric::EpsGrowth];

    /// Create a new growth calculator.
    #[must_use]
    pub const fn new(config: GrowthConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for GrowthFactor {
    fn factor(&self) -> Factor {
        Factor::Growth
    }

    fn metrics(&self) -> &[Metric] {
        &Self::METRICS
    }

    fn calculate(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Option<FactorScore> {
        weighted_factor(
            Factor::Growth,
            snapshot,
            ranker,
            &[
                (Metric::RevenueGrowth, self.config.revenue_weight),
                (Metric::EpsGrowth, self.config.eps_weight),
            ],
        )
    }
}
