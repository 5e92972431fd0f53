#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Composite financial health scores for equities.
//!
//! ronda is an umbrella crate that re-exports all ronda sub-crates for
//! convenience: the core types, the factor calculators, the combination
//! layer and the batch engine.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use ronda::engine::{EngineConfig, Orchestrator, SnapshotRepository, SqliteScoreStore};
//!
//! # async fn example() -> ronda::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let repository = Arc::new(SnapshotRepository::from_csv("data/snapshots.csv")?);
//! let store = Arc::new(SqliteScoreStore::connect(&config.database_url).await?);
//!
//! let report = Orchestrator::new(&config, repository, store).run(as_of).await?;
//! for scored in &report.scored {
//!     println!("{} {:.1} {}", scored.symbol, scored.score, scored.rating);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types and trait definitions ([`FactorCalculator`], [`ScoreStore`], etc.)
//! - [`signals`] - Sector statistics and the eleven factor calculators
//! - [`combine`] - Lifecycle classification, weighting and combination
//! - [`engine`] - Per-security pipeline, stabilizer, stores and orchestrator
//!
//! ## Architecture
//!
//! A scoring run for one date flows through:
//!
//! 1. **Repository** returns point-in-time snapshots for the active universe
//! 2. **Sector statistics** are built once and published for the run
//! 3. **Factor calculators** rank each metric within its sector
//! 4. **Lifecycle weights** blend the available factors into a raw composite
//! 5. **Stabilizer** smooths the raw composite against the previous score

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Core types and trait definitions for ronda.
///
/// - [`MetricSnapshot`] - raw per-security inputs for one date
/// - [`FactorCalculator`] - scores one factor from a snapshot
/// - [`PercentileRanker`] - sector-relative or benchmark ranking
/// - [`MetricRepository`] and [`ScoreStore`] - the data seams of a run
pub mod traits {
    pub use ronda_traits::*;
}

// Re-export core traits at top level for convenience
pub use ronda_traits::{FactorCalculator, MetricRepository, PercentileRanker, ScoreStore};

// Re-export error types
pub use ronda_traits::{Result, RondaError};

// Re-export common types
pub use ronda_traits::{
    CompositeScore, Date, Factor, LifecycleStage, MetricSnapshot, Rating, Symbol,
};

// ============================================================================
// Factor Calculators
// ============================================================================

/// Factor calculators.
///
/// ## Fundamental
///
/// - **Value**: P/E, P/B, P/S and PEG, cheaper is better
/// - **Growth**: revenue and EPS growth
/// - **Profitability**: margins, ROE and ROA
/// - **Financial health**: leverage and liquidity
///
/// ## Market
///
/// - **Momentum**: trailing 1, 3, 6 and 12 month returns
/// - **Technical**: RSI, MACD histogram, price versus SMA
///
/// ## Smart Money, Sentiment and Income
///
/// - **Analyst consensus**, **insider activity**, **institutional ownership**
/// - **News sentiment**
/// - **Dividend quality** (payers only)
///
/// # Example
///
/// ```ignore
/// use ronda::signals::{NormalizerConfig, SectorStatistics, default_calculators};
///
/// let stats = SectorStatistics::build(as_of, &snapshots, NormalizerConfig::default());
/// for calc in default_calculators() {
///     if let Some(score) = calc.calculate(&snapshots[0], &stats) {
///         println!("{}: {:.1}", calc.name(), score.value);
///     }
/// }
/// ```
pub mod signals {
    pub use ronda_signals::*;
}

// ============================================================================
// Combination
// ============================================================================

/// Lifecycle classification, weight allocation and composite combination.
///
/// # Example
///
/// ```ignore
/// use ronda::combine::{Combiner, WeightAllocator, WeightedSumCombiner};
///
/// let weights = WeightAllocator::default().allocate(stage, &available)?;
/// let raw = WeightedSumCombiner::new().combine(&factor_scores, &weights)?;
/// ```
pub mod combine {
    pub use ronda_combine::*;
}

// ============================================================================
// Engine
// ============================================================================

/// Scoring pipeline, stabilization, persistence and batch orchestration.
///
/// ## Key Components
///
/// - **ScoringEngine**: raw composite for one security
/// - **ScoreStabilizer**: exponential smoothing with cold start and reset
/// - **SqliteScoreStore**: persisted scores and reset events
/// - **Orchestrator**: bounded-concurrency run over the universe
/// - **PeerSimilarityEngine**: nearest same-sector companies
/// - **ScoreExplainer**: factor attribution of score changes
pub mod engine {
    pub use ronda_engine::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use ronda::prelude::*;
/// ```
pub mod prelude {
    pub use crate::engine::{EngineConfig, Orchestrator, RunReport, ScoringEngine};
    pub use crate::{
        CompositeScore, Date, Factor, FactorCalculator, MetricRepository, MetricSnapshot,
        PercentileRanker, Rating, Result, RondaError, ScoreStore,
    };
}
