#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the Ronda composite scoring engine.
//!
//! This crate provides the foundational abstractions shared by the factor
//! calculators, the weighting layer and the batch orchestrator.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod calculator;
pub mod error;
pub mod factor;
pub mod metric;
pub mod repository;
pub mod score;
pub mod stats;
pub mod types;

// Re-exports
pub use calculator::{FactorCalculator, PercentileRanker};
pub use error::{Result, RondaError};
pub use factor::{Factor, WeightSlot};
pub use metric::{BenchmarkCurve, Metric};
pub use repository::{MetricRepository, ScoreStore};
pub use score::{
    CompositeScore, ConfidenceLevel, FactorScore, LifecycleStage, MetricScore, Rating,
    ScoringMethod, StabilizerTransition,
};
pub use types::{
    DEFAULT_MIN_DIVIDEND_YIELD, Date, MetricSnapshot, ResetEvent, ResetKind, Security, Symbol,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
