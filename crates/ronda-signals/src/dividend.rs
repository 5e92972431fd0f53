//! Dividend quality factor, scored for dividend payers only.
//!
//! A security pays a dividend when its yield is at least the configured
//! minimum (0.5% by default). Non-payers get no dividend score and the factor
//! is excluded from their completeness denominator instead of counting as
//! missing.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the dividend quality factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendQualityConfig {
    /// Weight of the dividend yield (default: 0.3)
    pub yield_weight: f64,

    /// Weight of payout sustainability (default: 0.3)
    pub payout_weight: f64,

    /// Weight of dividend growth (default: 0.2)
    pub growth_weight: f64,

    /// Weight of consecutive years of increases (default: 0.2)
    pub streak_weight: f64,
}

impl Default for DividendQualityConfig {
    fn default() -> Self {
        Self {
            yield_weight: 0.3,
            payout_weight: 0.3,
            growth_weight: 0.2,
            streak_weight: 0.2,
        }
    }
}

/// Dividend quality factor calculator.
///
/// Payout sustainability is the distance of the payout ratio from its target
/// (45% by default) and is lower-is-better: paying out too little or too much
/// both score worse.
#[derive(Debug, Clone, Default)]
pub struct DividendQualityFactor {
    config: DividendQualityConfig,
}

impl DividendQualityFactor {
    const METRICS: [Metric; 4] = [
        Metric::DividendYield,
        Metric::PayoutDeviation,
        Metric::DividendGrowth,
        Metric::DividendStreak,
    ];

    /// Create a new dividend quality calculator.
    #[must_use]
    pub const fn new(config: DividendQualityConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for DividendQualityFactor {
    fn factor(&self) -> Factor {
        Factor::DividendQuality
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
            Factor::DividendQuality,
            snapshot,
            ranker,
            &[
                (Metric::DividendYield, c.yield_weight),
                (Metric::PayoutDeviation, c.payout_weight),
                (Metric::DividendGrowth, c.growth_weight),
                (Metric::DividendStreak, c.streak_weight),
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

    fn payer() -> MetricSnapshot {
        let mut s = MetricSnapshot::new("KO", "Staples", Date::from_ymd_opt(2024, 3, 29).unwrap());
        s.dividend_yield = Some(3.0);
        s.payout_ratio = Some(75.0);
        s.dividend_growth = Some(5.0);
        s.dividend_streak = Some(60);
        s
    }

    #[test]
    fn test_payer_scored() {
        let score = DividendQualityFactor::default().calculate(&payer(), &IdentityRanker).unwrap();
        // payout 30 points from target -> 70 after inversion
        let expected = 0.3 * 3.0 + 0.3 * 70.0 + 0.2 * 5.0 + 0.2 * 60.0;
        assert_relative_eq!(score.value, expected, epsilon = 1e-9);
        assert!(score.is_complete());
    }

    #[test]
    fn test_non_payer_not_scored() {
        let mut s = payer();
        s.dividend_yield = Some(0.2);
        assert!(DividendQualityFactor::default().calculate(&s, &IdentityRanker).is_none());

        s.dividend_yield = None;
        assert!(DividendQualityFactor::default().calculate(&s, &IdentityRanker).is_none());
    }
}
