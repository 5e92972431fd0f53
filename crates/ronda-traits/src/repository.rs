//! Upstream and downstream collaborators of a scoring run.
//!
//! The engine reads every snapshot for a date in one batched call through
//! [`MetricRepository`] and writes its read model through [`ScoreStore`].

use async_trait::async_trait;

use crate::{CompositeScore, Date, MetricSnapshot, ResetEvent, Result};

/// Batched, read-only access to metric snapshots.
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Every active security's snapshot for `as_of`.
    ///
    /// An `Err` here, or an empty result, means the run cannot proceed.
    async fn fetch_snapshots(&self, as_of: Date) -> Result<Vec<MetricSnapshot>>;
}

/// Persisted composite scores and reset events.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Insert or replace the score for `(score.symbol, score.as_of)`.
    async fn save(&self, score: &CompositeScore) -> Result<()>;

    /// The most recent score for `symbol` dated strictly before `before`.
    async fn previous_score(&self, symbol: &str, before: Date) -> Result<Option<CompositeScore>>;

    /// The most recent score for `symbol`.
    async fn latest(&self, symbol: &str) -> Result<Option<CompositeScore>>;

    /// Record a reset event and return its id.
    async fn record_reset(&self, event: &ResetEvent) -> Result<i64>;

    /// Unconsumed reset events for `symbol` that occurred on or before `as_of`.
    async fn pending_resets(&self, symbol: &str, as_of: Date) -> Result<Vec<ResetEvent>>;

    /// Mark reset events as consumed by the run for `as_of`.
    async fn mark_resets_consumed(&self, ids: &[i64], as_of: Date) -> Result<()>;
}
