//! Technical factor.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the technical factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    /// Weight of RSI (default: 1/3)
    pub rsi_weight: f64,

    /// Weight of the MACD histogram (default: 1/3)
    pub macd_weight: f64,

    /// Weight of price relative to the 50-day SMA (default: 1/3)
    pub trend_weight: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            rsi_weight: 1.0 / 3.0,
            macd_weight: 1.0 / 3.0,
            trend_weight: 1.0 / 3.0,
        }
    }
}

/// Technical factor calculator.
///
/// RSI is ranked higher-is-better like the other inputs; overbought
/// readings are not penalized.
#[derive(Debug, Clone, Default)]
pub struct TechnicalFactor {
    config: TechnicalConfig,
}

impl TechnicalFactor {
    const METRICS: [Metric; 3] = [Metric::Rsi, Metric::MacdHistogram, Metric::PriceVsSma50];

    /// Create a new technical calculator.
    #[must_use]
    pub const fn new(config: TechnicalConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for TechnicalFactor {
    fn factor(&self) -> Factor {
        Factor::Technical
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
            Factor::Technical,
            snapshot,
            ranker,
            &[
                (Metric::Rsi, c.rsi_weight),
                (Metric::MacdHistogram, c.macd_weight),
                (Metric::PriceVsSma50, c.trend_weight),
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
    fn test_technical() {
        let mut s = MetricSnapshot::new("AMD", "Technology", Date::from_ymd_opt(2024, 3, 29).unwrap());
        s.rsi = Some(60.0);
        s.price = Some(110.0);
        s.sma_50 = Some(100.0);

        let score = TechnicalFactor::default().calculate(&s, &IdentityRanker).unwrap();
        // price 10% above SMA
        assert_relative_eq!(score.components[1].raw, 10.0, epsilon = 1e-9);
        assert_relative_eq!(score.value, 35.0, epsilon = 1e-9);
        assert_eq!(score.missing, vec![Metric::MacdHistogram]);
    }
}
