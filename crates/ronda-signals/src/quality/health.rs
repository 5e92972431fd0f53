//! Financial health factor: leverage and liquidity.

use ronda_traits::stats::weighted_mean;
use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::Ranked;

/// Liquidity credit for a ratio with diminishing returns above `optimal`.
///
/// Ratios up to `optimal` are credited in full. Beyond it each extra unit
/// earns logarithmically less, so the credit is monotone non-decreasing:
/// holding more liquidity never ranks below holding less.
///
/// # Examples
///
/// ```
/// use ronda_signals::quality::credited_liquidity;
///
/// assert_eq!(credited_liquidity(1.0, 2.0), 1.0);
/// assert!(credited_liquidity(4.47, 2.0) > credited_liquidity(2.0, 2.0));
/// assert!(credited_liquidity(4.47, 2.0) < 4.47);
/// ```
#[must_use]
pub fn credited_liquidity(ratio: f64, optimal: f64) -> f64 {
    if ratio <= optimal {
        ratio
    } else {
        optimal + (ratio - optimal).ln_1p()
    }
}

/// Configuration for the financial health factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialHealthConfig {
    /// Weight of the leverage sub-score (default: 0.5)
    pub leverage_weight: f64,

    /// Weight of the liquidity sub-score (default: 0.5)
    pub liquidity_weight: f64,
}

impl Default for FinancialHealthConfig {
    fn default() -> Self {
        Self {
            leverage_weight: 0.5,
            liquidity_weight: 0.5,
        }
    }
}

/// Financial health factor calculator.
///
/// Two sub-scores are formed first: leverage from debt/equity (lower is
/// better) and interest coverage, and liquidity from the credited current
/// and quick ratios. The factor is their weighted average. A missing
/// sub-score drops out and the other carries the full weight.
#[derive(Debug, Clone, Default)]
pub struct FinancialHealthFactor {
    config: FinancialHealthConfig,
}

impl FinancialHealthFactor {
    const LEVERAGE: [Metric; 2] = [Metric::DebtToEquity, Metric::InterestCoverage];
    const LIQUIDITY: [Metric; 2] = [Metric::CurrentRatio, Metric::QuickRatio];
    const METRICS: [Metric; 4] = [
        Metric::DebtToEquity,
        Metric::InterestCoverage,
        Metric::CurrentRatio,
        Metric::QuickRatio,
    ];

    /// Create a new financial health calculator.
    #[must_use]
    pub const fn new(config: FinancialHealthConfig) -> Self {
        Self { config }
    }

    fn equal(metrics: [Metric; 2]) -> [(Metric, f64); 2] {
        metrics.map(|m| (m, 0.5))
    }
}

impl FactorCalculator for FinancialHealthFactor {
    fn factor(&self) -> Factor {
        Factor::FinancialHealth
    }

    fn metrics(&self) -> &[Metric] {
        &Self::METRICS
    }

    fn calculate(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Option<FactorScore> {
        let leverage = Ranked::collect(snapshot, ranker, &Self::equal(Self::LEVERAGE));
        let liquidity = Ranked::collect(snapshot, ranker, &Self::equal(Self::LIQUIDITY));

        let value = weighted_mean(
            &[
                (leverage.average(), self.config.leverage_weight),
                (liquidity.average(), self.config.liquidity_weight),
            ]
            .into_iter()
            .filter_map(|(v, w)| Some((v?, w)))
            .collect::<Vec<_>>(),
        )?;

        let mut ranked = leverage;
        ranked.extend(liquidity);
        ranked.into_score(Factor::FinancialHealth, value)
    }
}
