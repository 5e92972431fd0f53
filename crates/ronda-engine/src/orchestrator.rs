//! Batch scoring run for one date.
//!
//! One batched fetch, one [`SectorStatistics`] build published to the
//! [`DistributionTable`], then a bounded pool of workers scoring securities
//! independently. Per-security failures never abort the run; only an
//! unavailable upstream or cancellation does.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ronda_signals::{DistributionTable, NormalizerConfig, SectorStatistics};
use ronda_traits::{
    CompositeScore, Date, MetricRepository, MetricSnapshot, Rating, Result, RondaError,
    ScoreStore, StabilizerTransition, Symbol,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{EngineConfig, OrchestratorConfig};
use crate::engine::{Evaluation, ScoringEngine};

/// Shared flag for coarse cancellation of a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A persisted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSecurity {
    /// Security symbol.
    pub symbol: Symbol,
    /// Stabilized score.
    pub score: f64,
    /// Raw composite.
    pub raw_score: f64,
    /// Rating label.
    pub rating: Rating,
    /// Stabilizer transition.
    pub transition: StabilizerTransition,
    /// Completeness percentage.
    pub completeness: f64,
    /// Persist attempts used.
    pub attempts: u32,
}

/// A security left unscored for lack of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSecurity {
    /// Security symbol.
    pub symbol: Symbol,
    /// Why it was skipped.
    pub reason: String,
}

/// A security whose scoring failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSecurity {
    /// Security symbol.
    pub symbol: Symbol,
    /// Last error.
    pub error: String,
    /// Attempts made.
    pub attempts: u32,
}

/// Outcome of a run, each list sorted by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run date.
    pub as_of: Date,
    /// Snapshots fetched.
    pub universe: usize,
    /// Persisted scores.
    pub scored: Vec<ScoredSecurity>,
    /// Insufficient data.
    pub skipped: Vec<SkippedSecurity>,
    /// Errors.
    pub failed: Vec<FailedSecurity>,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

impl RunReport {
    fn sort(&mut self) {
        self.scored.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        self.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        self.failed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    }

    /// Persisted score for `symbol`, if any.
    #[must_use]
    pub fn scored(&self, symbol: &str) -> Option<&ScoredSecurity> {
        self.scored.iter().find(|s| s.symbol == symbol)
    }
}

enum Outcome {
    Scored(ScoredSecurity),
    Skipped(SkippedSecurity),
    Failed(FailedSecurity),
    Cancelled,
}

/// Runs batch scoring for a date.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
///
/// use ronda_engine::{EngineConfig, Orchestrator, SnapshotRepository, SqliteScoreStore};
///
/// let config = EngineConfig::from_env()?;
/// let repo = Arc::new(SnapshotRepository::from_csv("snapshots.csv")?);
/// let store = Arc::new(SqliteScoreStore::connect(&config.database_url).await?);
///
/// let report = Orchestrator::new(&config, repo, store).run(as_of).await?;
/// println!("{} scored, {} skipped", report.scored.len(), report.skipped.len());
/// ```
pub struct Orchestrator {
    repository: Arc<dyn MetricRepository>,
    store: Arc<dyn ScoreStore>,
    engine: Arc<ScoringEngine>,
    table: Arc<DistributionTable>,
    normalizer: NormalizerConfig,
    config: OrchestratorConfig,
    cancel: CancellationFlag,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator. The configuration should already be validated.
    pub fn new(
        config: &EngineConfig,
        repository: Arc<dyn MetricRepository>,
        store: Arc<dyn ScoreStore>,
    ) -> Self {
        Self {
            repository,
            store,
            engine: Arc::new(ScoringEngine::from_config(config)),
            table: Arc::new(DistributionTable::new()),
            normalizer: config.normalizer.clone(),
            config: config.orchestrator.clone(),
            cancel: CancellationFlag::new(),
        }
    }

    /// Publish statistics into a shared table instead of a private one.
    #[must_use]
    pub fn with_table(mut self, table: Arc<DistributionTable>) -> Self {
        self.table = table;
        self
    }

    /// Use an externally owned cancellation flag.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that cancels this orchestrator's runs.
    #[must_use]
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Table holding the statistics of the latest run.
    #[must_use]
    pub fn table(&self) -> Arc<DistributionTable> {
        Arc::clone(&self.table)
    }

    /// Score every security for `as_of`.
    ///
    /// # Errors
    ///
    /// - [`RondaError::UpstreamUnavailable`] if the fetch fails or is empty
    /// - [`RondaError::Cancelled`] if the run was cancelled
    pub async fn run(&self, as_of: Date) -> Result<RunReport> {
        let started = Instant::now();
        if self.cancel.is_cancelled() {
            return Err(RondaError::Cancelled);
        }

        let snapshots = self.fetch(as_of).await?;
        tracing::info!(%as_of, securities = snapshots.len(), "starting scoring run");

        let stats = self.table.publish(SectorStatistics::build(
            as_of,
            &snapshots,
            self.normalizer.clone(),
        ));

        let mut report = RunReport {
            as_of,
            universe: snapshots.len(),
            ..Default::default()
        };
        let mut pending: BTreeSet<Symbol> =
            snapshots.iter().map(|s| s.symbol().to_string()).collect();

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = JoinSet::new();

        for snapshot in snapshots {
            let semaphore = Arc::clone(&semaphore);
            let engine = Arc::clone(&self.engine);
            let store = Arc::clone(&self.store);
            let stats = Arc::clone(&stats);
            let cancel = self.cancel.clone();
            let config = self.config.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (snapshot.security.symbol, Outcome::Cancelled);
                };
                if cancel.is_cancelled() {
                    return (snapshot.security.symbol, Outcome::Cancelled);
                }
                let outcome =
                    score_security(&engine, store.as_ref(), &stats, &snapshot, as_of, &config)
                        .await;
                (snapshot.security.symbol, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, outcome)) => {
                    pending.remove(&symbol);
                    match outcome {
                        Outcome::Scored(s) => report.scored.push(s),
                        Outcome::Skipped(s) => report.skipped.push(s),
                        Outcome::Failed(f) => report.failed.push(f),
                        Outcome::Cancelled => {}
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "scoring task failed"),
            }
            if self.cancel.is_cancelled() {
                tasks.abort_all();
            }
        }

        if self.cancel.is_cancelled() {
            tracing::warn!(%as_of, scored = report.scored.len(), "scoring run cancelled");
            return Err(RondaError::Cancelled);
        }

        report.failed.extend(pending.into_iter().map(|symbol| FailedSecurity {
            symbol,
            error: "worker task aborted".to_string(),
            attempts: 0,
        }));
        report.sort();
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            %as_of,
            scored = report.scored.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "scoring run complete"
        );
        Ok(report)
    }

    async fn fetch(&self, as_of: Date) -> Result<Vec<MetricSnapshot>> {
        let snapshots = self
            .repository
            .fetch_snapshots(as_of)
            .await
            .map_err(|e| match e {
                RondaError::UpstreamUnavailable(_) => e,
                other => RondaError::UpstreamUnavailable(other.to_string()),
            });

        match snapshots {
            Ok(snapshots) if snapshots.is_empty() => {
                tracing::error!(%as_of, "upstream returned no snapshots");
                Err(RondaError::UpstreamUnavailable(format!(
                    "no snapshots for {as_of}"
                )))
            }
            Ok(snapshots) => Ok(dedup_by_symbol(snapshots)),
            Err(e) => {
                tracing::error!(%as_of, error = %e, "snapshot fetch failed");
                Err(e)
            }
        }
    }
}

/// One snapshot per symbol, keeping the most recent.
fn dedup_by_symbol(snapshots: Vec<MetricSnapshot>) -> Vec<MetricSnapshot> {
    let fetched = snapshots.len();
    let mut latest: BTreeMap<Symbol, MetricSnapshot> = BTreeMap::new();
    for snapshot in snapshots {
        match latest.get(snapshot.symbol()) {
            Some(kept) if kept.as_of >= snapshot.as_of => {}
            _ => {
                latest.insert(snapshot.symbol().to_string(), snapshot);
            }
        }
    }
    if latest.len() < fetched {
        tracing::warn!(
            fetched,
            unique = latest.len(),
            "duplicate symbols in upstream snapshots, keeping the latest of each"
        );
    }
    latest.into_values().collect()
}

async fn score_security(
    engine: &ScoringEngine,
    store: &dyn ScoreStore,
    stats: &SectorStatistics,
    snapshot: &MetricSnapshot,
    as_of: Date,
    config: &OrchestratorConfig,
) -> Outcome {
    let symbol = snapshot.symbol().to_string();

    let evaluation = match engine.evaluate(snapshot, stats) {
        Ok(evaluation) => evaluation,
        Err(RondaError::InsufficientData(reason)) => {
            tracing::debug!(symbol, reason, "insufficient data, not scored");
            return Outcome::Skipped(SkippedSecurity { symbol, reason });
        }
        Err(e) => {
            tracing::warn!(symbol, error = %e, "scoring failed");
            return Outcome::Failed(FailedSecurity {
                symbol,
                error: e.to_string(),
                attempts: 1,
            });
        }
    };

    let mut attempt = 1;
    loop {
        match persist(engine, store, evaluation.clone(), as_of).await {
            Ok(score) => {
                return Outcome::Scored(ScoredSecurity {
                    symbol,
                    score: score.score,
                    raw_score: score.raw_score,
                    rating: score.rating,
                    transition: score.transition,
                    completeness: score.completeness,
                    attempts: attempt,
                });
            }
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                tracing::warn!(symbol, attempt, error = %e, "persist failed, retrying");
                tokio::time::sleep(Duration::from_millis(config.retry_backoff_ms)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(symbol, attempt, error = %e, "persist failed");
                return Outcome::Failed(FailedSecurity {
                    symbol,
                    error: e.to_string(),
                    attempts: attempt,
                });
            }
        }
    }
}

/// Stabilize against the stored history, save, then consume resets.
async fn persist(
    engine: &ScoringEngine,
    store: &dyn ScoreStore,
    evaluation: Evaluation,
    as_of: Date,
) -> Result<CompositeScore> {
    let symbol = evaluation.symbol.clone();
    let previous = store
        .previous_score(&symbol, as_of)
        .await?
        .map(|s| s.score);
    let resets = store.pending_resets(&symbol, as_of).await?;

    let score = engine.finalize(evaluation, as_of, previous, !resets.is_empty());
    store.save(&score).await?;

    let ids: Vec<i64> = resets.iter().filter_map(|r| r.id).collect();
    if !ids.is_empty() {
        store.mark_resets_consumed(&ids, as_of).await?;
        tracing::debug!(symbol, resets = ids.len(), "reset events consumed");
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SnapshotRepository;
    use crate::store::MemoryScoreStore;
    use crate::testing::{as_of, full_snapshot};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use ronda_traits::{Factor, ResetEvent, ResetKind};
    use std::sync::atomic::AtomicU32;

    fn orchestrator(
        snapshots: Vec<MetricSnapshot>,
        store: Arc<dyn ScoreStore>,
        config: EngineConfig,
    ) -> Orchestrator {
        Orchestrator::new(&config, Arc::new(SnapshotRepository::new(snapshots)), store)
    }

    fn fast_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.orchestrator.retry_backoff_ms = 1;
        config.orchestrator.workers = 2;
        config
    }

    #[tokio::test]
    async fn test_missing_insider_redistributes_weights() {
        let full = full_snapshot("FULL", "Tech", 1.0);
        let mut partial = full_snapshot("PART", "Tech", 1.0);
        partial.insider_net_shares = None;
        partial.insider_net_value = None;

        let store = Arc::new(MemoryScoreStore::new());
        let report = orchestrator(vec![full, partial], store.clone(), fast_config())
            .run(as_of())
            .await
            .unwrap();
        assert_eq!(report.scored.len(), 2);
        assert!(report.failed.is_empty());

        let full = store.latest("FULL").await.unwrap().unwrap();
        let partial = store.latest("PART").await.unwrap().unwrap();
        assert_eq!(full.lifecycle, partial.lifecycle);

        let total = |s: &CompositeScore| s.weights.values().sum::<f64>();
        assert_relative_eq!(total(&full), 1.0, epsilon = 1e-9);
        assert_relative_eq!(total(&partial), 1.0, epsilon = 1e-9);

        assert!(!partial.weights.contains_key(&Factor::InsiderActivity));
        assert!(partial.factor(Factor::InsiderActivity).is_none());
        for factor in [Factor::AnalystConsensus, Factor::InstitutionalOwnership] {
            assert_relative_eq!(
                partial.weights[&factor] / full.weights[&factor],
                1.0 / 0.7,
                epsilon = 1e-9
            );
        }
        assert_relative_eq!(
            partial.weights[&Factor::Value],
            full.weights[&Factor::Value],
            epsilon = 1e-12
        );
        assert!(partial.completeness < full.completeness);
    }

    #[tokio::test]
    async fn test_cold_reset_and_smoothed_runs() {
        let store = Arc::new(MemoryScoreStore::new());
        let orch = orchestrator(
            vec![full_snapshot("AAA", "Tech", 1.0), full_snapshot("BBB", "Tech", 1.3)],
            store.clone(),
            fast_config(),
        );
        let day1 = as_of();
        let day2 = day1.succ_opt().unwrap();
        let day3 = day2.succ_opt().unwrap();

        let first = orch.run(day1).await.unwrap();
        let cold = first.scored("AAA").unwrap();
        assert_eq!(cold.transition, StabilizerTransition::ColdStart);
        assert_relative_eq!(cold.score, cold.raw_score);

        store
            .record_reset(&ResetEvent::new("AAA", ResetKind::EarningsRelease, day2))
            .await
            .unwrap();

        let second = orch.run(day2).await.unwrap();
        let reset = second.scored("AAA").unwrap();
        assert_eq!(reset.transition, StabilizerTransition::Reset);
        assert_relative_eq!(reset.score, reset.raw_score);
        assert_eq!(
            second.scored("BBB").unwrap().transition,
            StabilizerTransition::Smoothed
        );
        assert!(store.pending_resets("AAA", day3).await.unwrap().is_empty());

        let third = orch.run(day3).await.unwrap();
        let smoothed = third.scored("AAA").unwrap();
        assert_eq!(smoothed.transition, StabilizerTransition::Smoothed);
        assert_relative_eq!(
            smoothed.score,
            0.3 * smoothed.raw_score + 0.7 * reset.score,
            epsilon = 1e-9
        );

        assert_eq!(orch.table().current().unwrap().as_of(), day3);
    }

    #[tokio::test]
    async fn test_rerun_after_reset_keeps_raw_score() {
        let store = Arc::new(MemoryScoreStore::new());
        let orch = orchestrator(
            vec![full_snapshot("AAA", "Tech", 1.0)],
            store.clone(),
            fast_config(),
        );
        let day1 = as_of();
        let day2 = day1.succ_opt().unwrap();

        orch.run(day1).await.unwrap();
        let mut low = store.latest("AAA").await.unwrap().unwrap();
        low.score = 10.0;
        store.save(&low).await.unwrap();

        store
            .record_reset(&ResetEvent::new("AAA", ResetKind::EarningsRelease, day2))
            .await
            .unwrap();

        let first = orch.run(day2).await.unwrap();
        let rerun = orch.run(day2).await.unwrap();
        for report in [&first, &rerun] {
            let scored = report.scored("AAA").unwrap();
            assert_eq!(scored.transition, StabilizerTransition::Reset);
            assert_relative_eq!(scored.score, scored.raw_score);
        }
        assert_relative_eq!(
            store.latest("AAA").await.unwrap().unwrap().score,
            first.scored("AAA").unwrap().score
        );
    }

    #[tokio::test]
    async fn test_insufficient_data_is_skipped() {
        let mut thin = MetricSnapshot::new("THIN", "Tech", as_of());
        thin.rsi = Some(50.0);

        let store = Arc::new(MemoryScoreStore::new());
        let report = orchestrator(
            vec![full_snapshot("AAA", "Tech", 1.0), thin],
            store.clone(),
            fast_config(),
        )
        .run(as_of())
        .await
        .unwrap();

        assert_eq!(report.universe, 2);
        assert_eq!(report.scored.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].symbol, "THIN");
        assert!(store.latest("THIN").await.unwrap().is_none());
    }

    struct FailingRepository;

    #[async_trait]
    impl MetricRepository for FailingRepository {
        async fn fetch_snapshots(&self, _as_of: Date) -> Result<Vec<MetricSnapshot>> {
            Err(RondaError::Io(std::io::Error::other("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_upstream_unavailable_is_fatal() {
        let store = Arc::new(MemoryScoreStore::new());

        let empty = orchestrator(vec![], store.clone(), fast_config());
        assert!(matches!(
            empty.run(as_of()).await,
            Err(RondaError::UpstreamUnavailable(_))
        ));

        let failing = Orchestrator::new(&fast_config(), Arc::new(FailingRepository), store);
        assert!(matches!(
            failing.run(as_of()).await,
            Err(RondaError::UpstreamUnavailable(_))
        ));
    }

    struct DuplicatingRepository(Vec<MetricSnapshot>);

    #[async_trait]
    impl MetricRepository for DuplicatingRepository {
        async fn fetch_snapshots(&self, _as_of: Date) -> Result<Vec<MetricSnapshot>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_duplicate_symbols_scored_once() {
        let older = full_snapshot("AAA", "Tech", 1.0);
        let mut newer = full_snapshot("AAA", "Tech", 2.0);
        newer.as_of = as_of().succ_opt().unwrap();
        let other = full_snapshot("BBB", "Tech", 1.2);

        let store = Arc::new(MemoryScoreStore::new());
        let repository = DuplicatingRepository(vec![older, newer.clone(), other]);
        let report = Orchestrator::new(&fast_config(), Arc::new(repository), store.clone())
            .run(newer.as_of)
            .await
            .unwrap();

        assert_eq!(report.universe, 2);
        assert_eq!(report.scored.len(), 2);
        assert!(report.failed.is_empty());
        let stored = store.history("AAA");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].metadata["snapshot_as_of"], serde_json::json!(newer.as_of));

        let kept = dedup_by_symbol(vec![newer.clone(), full_snapshot("AAA", "Tech", 1.0)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].as_of, newer.as_of);
    }

    /// Fails the first `failures` saves with a store error.
    struct FlakyStore {
        inner: MemoryScoreStore,
        failures: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryScoreStore::new(),
                failures: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl ScoreStore for FlakyStore {
        async fn save(&self, score: &CompositeScore) -> Result<()> {
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(RondaError::Store("database is locked".into()));
            }
            self.inner.save(score).await
        }

        async fn previous_score(
            &self,
            symbol: &str,
            before: Date,
        ) -> Result<Option<CompositeScore>> {
            self.inner.previous_score(symbol, before).await
        }

        async fn latest(&self, symbol: &str) -> Result<Option<CompositeScore>> {
            self.inner.latest(symbol).await
        }

        async fn record_reset(&self, event: &ResetEvent) -> Result<i64> {
            self.inner.record_reset(event).await
        }

        async fn pending_resets(&self, symbol: &str, as_of: Date) -> Result<Vec<ResetEvent>> {
            self.inner.pending_resets(symbol, as_of).await
        }

        async fn mark_resets_consumed(&self, ids: &[i64], as_of: Date) -> Result<()> {
            self.inner.mark_resets_consumed(ids, as_of).await
        }
    }

    #[tokio::test]
    async fn test_transient_store_error_is_retried() {
        let store = Arc::new(FlakyStore::new(1));
        let report = orchestrator(vec![full_snapshot("AAA", "Tech", 1.0)], store.clone(), fast_config())
            .run(as_of())
            .await
            .unwrap();

        assert_eq!(report.scored.len(), 1);
        assert_eq!(report.scored[0].attempts, 2);
        assert!(store.latest("AAA").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_reported() {
        let mut config = fast_config();
        config.orchestrator.max_attempts = 1;
        let store = Arc::new(FlakyStore::new(1));

        let report = orchestrator(
            vec![full_snapshot("AAA", "Tech", 1.0), full_snapshot("BBB", "Tech", 1.1)],
            store,
            config,
        )
        .run(as_of())
        .await
        .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].attempts, 1);
        assert!(report.failed[0].error.contains("locked"));
        assert_eq!(report.scored.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let orch = orchestrator(
            vec![full_snapshot("AAA", "Tech", 1.0)],
            Arc::new(MemoryScoreStore::new()),
            fast_config(),
        );
        orch.cancellation().cancel();
        assert!(matches!(orch.run(as_of()).await, Err(RondaError::Cancelled)));
    }
}
