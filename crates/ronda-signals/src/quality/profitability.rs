//! Profitability factor.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the profitability factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitabilityConfig {
    /// Weight of net margin (default: 0.25)
    pub net_margin_weight: f64,

    /// Weight of operating margin (default: 0.25)
    pub operating_margin_weight: f64,

    /// Weight of return on equity (default: 0.25)
    pub roe_weight: f64,

    /// Weight of return on assets (default: 0.25)
    pub roa_weight: f64,
}

impl Default for ProfitabilityConfig {
    fn default() -> Self {
        Self {
            net_margin_weight: 0.25,
            operating_margin_weight: 0.25,
            roe_weight: 0.25,
            roa_weight: 0.25,
        }
    }
}

/// Profitability factor calculator.
///
/// Margins measure how much of each sales dollar is kept; ROE and ROA
/// measure how efficiently capital is turned into earnings. All four are
/// higher-is-better and ranked within sector.
///
/// # Example
///
/// ```ignore
/// use ronda_signals::quality::{ProfitabilityConfig, ProfitabilityFactor};
///
/// // Returns on capital only
/// let config = ProfitabilityConfig {
///     net_margin_weight: 0.0,
///     operating_margin_weight: 0.0,
///     ..Default::default()
/// };
/// let calc = ProfitabilityFactor::new(config);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfitabilityFactor {
    config: ProfitabilityConfig,
}

impl ProfitabilityFactor {
    const METRICS: [Metric; 4] = [
        Metric::NetMargin,
        Metric::OperatingMargin,
        Metric::ReturnOnEquity,
        Metric::ReturnOnAssets,
    ];

    /// Create a new profitability calculator.
    #[must_use]
    pub const fn new(config: ProfitabilityConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for ProfitabilityFactor {
    fn factor(&self) -> Factor {
        Factor::Profitability
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
            Factor::Profitability,
            snapshot,
            ranker,
            &[
                (Metric::NetMargin, c.net_margin_weight),
                (Metric::OperatingMargin, c.operating_margin_weight),
                (Metric::ReturnOnEquity, c.roe_weight),
                (Metric::ReturnOnAssets, c.roa_weight),
            ],
        )
    }
}
