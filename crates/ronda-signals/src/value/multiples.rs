//! Valuation multiples calculator.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the value factor.
///
/// Weights are relative; missing multiples drop out and the rest are
/// renormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Weight of price-to-earnings (default: 0.25)
    pub pe_weight: f64,

    /// Weight of price-to-book (default: 0.25)
    pub pb_weight: f64,

    /// Weight of price-to-sales (default: 0.25)
    pub ps_weight: f64,

    /// Weight of the PEG ratio (default: 0.25)
    pub peg_weight: f64,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            pe_weight: 0.25,
            pb_weight: 0.25,
            ps_weight: 0.25,
            peg_weight: 0.25,
        }
    }
}

/// Value factor calculator.
///
/// Averages the sector percentiles of P/E, P/B, P/S and PEG. Because the
/// multiples are lower-is-better, the percentiles arrive already inverted and
/// a cheap security scores high.
///
/// # Example
///
/// ```ignore
/// use ronda_signals::value::ValueFactor;
///
/// let value = ValueFactor::default();
/// let score = value.calculate(&snapshot, &sector_stats);
/// ```
#[derive(Debug, Clone)]
pub struct ValueFactor {
    config: ValueConfig,
}

impl ValueFactor {
    const METRICS: [Metric; 4] = [
        Metric::PriceToEarnings,
        Metric::PriceToBook,
        Metric::PriceToSales,
        Metric::PriceEarningsToGrowth,
    ];

    /// Create a new value calculator with the given configuration.
    #[must_use]
    pub const fn new(config: ValueConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ValueConfig {
        &self.config
    }
}

impl Default for ValueFactor {
    fn default() -> Self {
        Self::new(ValueConfig::default())
    }
}

impl FactorCalculator for ValueFactor {
    fn factor(&self) -> Factor {
        Factor::Value
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
            Factor::Value,
            snapshot,
            ranker,
            &[
                (Metric::PriceToEarnings, c.pe_weight),
                (Metric::PriceToBook, c.pb_weight),
                (Metric::PriceToSales, c.ps_weight),
                (Metric::PriceEarningsToGrowth, c.peg_weight),
            ],
        )
    }
}
