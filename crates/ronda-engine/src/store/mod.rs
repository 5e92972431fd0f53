//! Score store implementations.
//!
//! - [`MemoryScoreStore`]: concurrent in-process store for tests and dry runs
//! - [`SqliteScoreStore`]: the persisted read model

mod memory;
mod sqlite;

pub use memory::MemoryScoreStore;
pub use sqlite::SqliteScoreStore;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use ronda_traits::{
        CompositeScore, ConfidenceLevel, Date, Factor, FactorScore, LifecycleStage, Metric,
        MetricScore, Rating, ScoringMethod, StabilizerTransition,
    };

    /// A plausible persisted score.
    pub(crate) fn sample_score(symbol: &str, as_of: Date, score: f64) -> CompositeScore {
        let value = FactorScore {
            factor: Factor::Value,
            value: 64.0,
            method: ScoringMethod::SectorRelative,
            components: vec![MetricScore {
                metric: Metric::PriceToEarnings,
                raw: 14.2,
                percentile: 64.0,
                method: ScoringMethod::SectorRelative,
                sample_count: 12,
            }],
            missing: vec![Metric::PriceEarningsToGrowth],
        };
        CompositeScore {
            symbol: symbol.to_string(),
            sector: "Tech".to_string(),
            as_of,
            score,
            raw_score: score,
            lifecycle: LifecycleStage::Mature,
            lifecycle_confidence: 0.6,
            rating: Rating::from_score(score),
            weights: BTreeMap::from([(Factor::Value, 1.0)]),
            completeness: 10.0,
            confidence: ConfidenceLevel::Low,
            transition: StabilizerTransition::ColdStart,
            factor_scores: vec![value],
            metadata: serde_json::json!({ "combiner": "weighted_sum" }),
            config_version: "v1".to_string(),
        }
    }
}
