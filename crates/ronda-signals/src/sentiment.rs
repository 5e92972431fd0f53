//! News sentiment factor.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the news sentiment factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSentimentConfig {
    /// Weight of the average article sentiment (default: 0.6)
    pub sentiment_weight: f64,

    /// Weight of the net positive article ratio (default: 0.4)
    pub net_positive_weight: f64,
}

impl Default for NewsSentimentConfig {
    fn default() -> Self {
        Self {
            sentiment_weight: 0.6,
            net_positive_weight: 0.4,
        }
    }
}

/// News sentiment factor calculator.
///
/// Requires at least one article in the window; without coverage the factor
/// is missing rather than neutral.
#[derive(Debug, Clone, Default)]
pub struct NewsSentimentFactor {
    config: NewsSentimentConfig,
}

impl NewsSentimentFactor {
    const METRICS: [Metric; 2] = [Metric::NewsSentiment, Metric::NewsNetPositive];

    /// Create a new news sentiment calculator.
    #[must_use]
    pub const fn new(config: NewsSentimentConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for NewsSentimentFactor {
    fn factor(&self) -> Factor {
        Factor::NewsSentiment
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
            Factor::NewsSentiment,
            snapshot,
            ranker,
            &[
                (Metric::NewsSentiment, self.config.sentiment_weight),
                (Metric::NewsNetPositive, self.config.net_positive_weight),
            ],
        )
    }
}
