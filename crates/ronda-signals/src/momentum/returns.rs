//! Momentum factor over trailing returns.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the momentum factor.
///
/// Each horizon's weight applies to its sector percentile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Weight of the 1-month return (default: 0.2)
    pub one_month_weight: f64,

    /// Weight of the 3-month return (default: 0.3)
    pub three_month_weight: f64,

    /// Weight of the 6-month return (default: 0.3)
    pub six_month_weight: f64,

    /// Weight of the 12-month return (default: 0.2)
    pub twelve_month_weight: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            one_month_weight: 0.2,
            three_month_weight: 0.3,
            six_month_weight: 0.3,
            twelve_month_weight: 0.2,
        }
    }
}

/// Momentum factor calculator.
///
/// # Example
///
/// ```ignore
/// use ronda_signals::momentum::{MomentumConfig, MomentumFactor};
///
/// // Long horizons only
/// let config = MomentumConfig {
///     one_month_weight: 0.0,
///     three_month_weight: 0.0,
///     ..Default::default()
/// };
/// let momentum = MomentumFactor::new(config);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MomentumFactor {
    config: MomentumConfig,
}

impl MomentumFactor {
    const METRICS: [Metric; 4] = [
        Metric::Return1m,
        Metric::Return3m,
        Metric::Return6m,
        Metric::Return12m,
    ];

    /// Create a new momentum calculator.
    #[must_use]
    pub const fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &MomentumConfig {
        &self.config
    }
}

impl FactorCalculator for MomentumFactor {
    fn factor(&self) -> Factor {
        Factor::Momentum
    }

    fn metrics(&self) -> &[Metric] {
        &Self::METRICS
    }

    fn calculate(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Option<FactorScore> {
        let c = &self.config;
        weighted_factor(
            Factor::Momentum,
            snapshot,
            ranker,
            &[
                (Metric::Return1m, c.one_month_weight),
                (Metric::Return3m, c.three_month_weight),
                (Metric::Return6m, c.six_month_weight),
                (Metric::Return12m, c.twelve_month_weight),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::testing::IdentityRanker;
    use approx::assert_relative_eq;
    use ronda_traits::Date;

    #[test]
    fn test_default_weights_sum_to_one() {
        let c = MomentumConfig::default();
        assert_relative_eq!(
            c.one_month_weight + c.three_month_weight + c.six_month_weight + c.twelve_month_weight,
            1.0
        );
    }

    #[test]
    fn test_weighted_horizons() {
        let mut s = MetricSnapshot::new("NVDA", "Technology", Date::from_ymd_opt(2024, 3, 29).unwrap());
        s.return_1m = Some(10.0);
        s.return_3m = Some(20.0);
        s.return_6m = Some(40.0);
        s.return_12m = Some(90.0);

        let score = MomentumFactor::default().calculate(&s, &IdentityRanker).unwrap();
        assert_relative_eq!(score.value, 0.2 * 10.0 + 0.3 * 20.0 + 0.3 * 40.0 + 0.2 * 90.0);
    }

    #[test]
    fn test_partial_history() {
        let mut s = MetricSnapshot::new("IPO", "Technology", Date::from_ymd_opt(2024, 3, 29).unwrap());
        s.return_1m = Some(30.0);
        s.return_3m = Some(60.0);

        let score = MomentumFactor::default().calculate(&s, &IdentityRanker).unwrap();
        assert_relative_eq!(score.value, (0.2 * 30.0 + 0.3 * 60.0) / 0.5);
        assert_eq!(score.missing, vec![Metric::Return6m, Metric::Return12m]);
    }
}
