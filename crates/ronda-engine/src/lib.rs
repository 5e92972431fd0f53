//! Scoring pipeline and batch runs for ronda.
//!
//! This crate wires the factor calculators and the combination layer into a
//! daily scoring run:
//! - Repository: point-in-time metric snapshots from CSV, JSON or a DataFrame
//! - Engine: factor scores, completeness gate, lifecycle weights and the raw
//!   composite for one security
//! - Stabilizer: exponential smoothing against the previous persisted score,
//!   with cold starts and corporate-action resets
//! - Store: persisted composite scores and reset events (in memory or SQLite)
//! - Orchestrator: bounded-concurrency run over the active universe
//! - Peers: nearest same-sector companies by size, valuation and growth
//! - Explain: factor attribution of the move between two stored scores
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ronda_engine::{EngineConfig, MemoryScoreStore, Orchestrator, SnapshotRepository};
//!
//! # async fn run() -> ronda_traits::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let repository = Arc::new(SnapshotRepository::from_csv("data/snapshots.csv")?);
//! let store = Arc::new(MemoryScoreStore::new());
//!
//! let orchestrator = Orchestrator::new(&config, repository, store);
//! let as_of = chrono::NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
//! let report = orchestrator.run(as_of).await?;
//! println!("scored {} of {}", report.scored.len(), report.universe);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod explain;
pub mod orchestrator;
pub mod peers;
pub mod repository;
pub mod stabilizer;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{EngineConfig, OrchestratorConfig};
pub use engine::{Evaluation, ScoringEngine};
pub use explain::{
    ExplainerConfig, FactorChange, FactorStatus, ScoreExplainer, ScoreExplanation,
};
pub use orchestrator::{
    CancellationFlag, FailedSecurity, Orchestrator, RunReport, ScoredSecurity, SkippedSecurity,
};
pub use peers::{Peer, PeerConfig, PeerSimilarityEngine};
pub use repository::SnapshotRepository;
pub use stabilizer::{ScoreStabilizer, Stabilized, StabilizerConfig, StabilizerState};
pub use store::{MemoryScoreStore, SqliteScoreStore};
