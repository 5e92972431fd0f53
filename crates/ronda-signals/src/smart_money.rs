//! Smart money factors: analysts, insiders and institutions.
//!
//! These three factors share one weight slot in the lifecycle profiles and are
//! split by fixed internal proportions in the allocator. Each is still scored
//! on its own here so that a security with no insider filings keeps its
//! analyst and institutional scores.

use ronda_traits::{
    Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
};
use serde::{Deserialize, Serialize};

use crate::factor::weighted_factor;

/// Configuration for the analyst consensus factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystConsensusConfig {
    /// Weight of the buy/hold/sell rating score (default: 0.6)
    pub rating_weight: f64,

    /// Weight of the price-target upside (default: 0.4)
    pub upside_weight: f64,
}

impl Default for AnalystConsensusConfig {
    fn default() -> Self {
        Self {
            rating_weight: 0.6,
            upside_weight: 0.4,
        }
    }
}

/// Analyst consensus factor calculator.
///
/// The rating score is `(100 * buy + 50 * hold) / total` over all covering
/// analysts; upside is the consensus target relative to the current price.
#[derive(Debug, Clone, Default)]
pub struct AnalystConsensusFactor {
    config: AnalystConsensusConfig,
}

impl AnalystConsensusFactor {
    const METRICS: [Metric; 2] = [Metric::AnalystRating, Metric::TargetUpside];

    /// Create a new analyst consensus calculator.
    #[must_use]
    pub const fn new(config: AnalystConsensusConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for AnalystConsensusFactor {
    fn factor(&self) -> Factor {
        Factor::AnalystConsensus
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
            Factor::AnalystConsensus,
            snapshot,
            ranker,
            &[
                (Metric::AnalystRating, self.config.rating_weight),
                (Metric::TargetUpside, self.config.upside_weight),
            ],
        )
    }
}

/// Configuration for the insider activity factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsiderActivityConfig {
    /// Weight of net shares as % of shares outstanding (default: 0.5)
    pub shares_weight: f64,

    /// Weight of net value as % of market cap (default: 0.5)
    pub value_weight: f64,
}

impl Default for InsiderActivityConfig {
    fn default() -> Self {
        Self {
            shares_weight: 0.5,
            value_weight: 0.5,
        }
    }
}

/// Insider activity factor calculator.
///
/// Net insider buying is measured relative to company size, never in raw
/// share counts or dollars, so a large cap and a small cap with the same
/// proportional buying rank alike.
#[derive(Debug, Clone, Default)]
pub struct InsiderActivityFactor {
    config: InsiderActivityConfig,
}

impl InsiderActivityFactor {
    const METRICS: [Metric; 2] = [Metric::InsiderNetSharesPct, Metric::InsiderNetValuePct];

    /// Create a new insider activity calculator.
    #[must_use]
    pub const fn new(config: InsiderActivityConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for InsiderActivityFactor {
    fn factor(&self) -> Factor {
        Factor::InsiderActivity
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
            Factor::InsiderActivity,
            snapshot,
            ranker,
            &[
                (Metric::InsiderNetSharesPct, self.config.shares_weight),
                (Metric::InsiderNetValuePct, self.config.value_weight),
            ],
        )
    }
}

/// Configuration for the institutional ownership factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstitutionalOwnershipConfig {
    /// Weight of ownership % of shares outstanding (default: 0.4)
    pub ownership_weight: f64,

    /// Weight of quarter-over-quarter holdings change (default: 0.4)
    pub change_weight: f64,

    /// Weight of holder count (default: 0.2)
    pub holders_weight: f64,
}

impl Default for InstitutionalOwnershipConfig {
    fn default() -> Self {
        Self {
            ownership_weight: 0.4,
            change_weight: 0.4,
            holders_weight: 0.2,
        }
    }
}

/// Institutional ownership factor calculator.
#[derive(Debug, Clone, Default)]
pub struct InstitutionalOwnershipFactor {
    config: InstitutionalOwnershipConfig,
}

impl InstitutionalOwnershipFactor {
    const METRICS: [Metric; 3] = [
        Metric::InstitutionalOwnershipPct,
        Metric::InstitutionalChangePct,
        Metric::InstitutionalHolders,
    ];

    /// Create a new institutional ownership calculator.
    #[must_use]
    pub const fn new(config: InstitutionalOwnershipConfig) -> Self {
        Self { config }
    }
}

impl FactorCalculator for InstitutionalOwnershipFactor {
    fn factor(&self) -> Factor {
        Factor::InstitutionalOwnership
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
            Factor::InstitutionalOwnership,
            snapshot,
            ranker,
            &[
                (Metric::InstitutionalOwnershipPct, c.ownership_weight),
                (Metric::InstitutionalChangePct, c.change_weight),
                (Metric::InstitutionalHolders, c.holders_weight),
            ],
        )
    }
}
