use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use ronda_traits::{CompositeScore, Date, ResetEvent, Result, RondaError, ScoreStore, Symbol};

/// In-memory [`ScoreStore`] backed by concurrent maps.
#[derive(Debug)]
pub struct MemoryScoreStore {
    scores: DashMap<Symbol, BTreeMap<Date, CompositeScore>>,
    resets: DashMap<i64, ResetEvent>,
    next_id: AtomicI64,
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScoreStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scores: DashMap::new(),
            resets: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Every score stored for `symbol`, oldest first.
    #[must_use]
    pub fn history(&self, symbol: &str) -> Vec<CompositeScore> {
        self.scores
            .get(symbol)
            .map(|h| h.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored scores across symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.iter().map(|h| h.len()).sum()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn save(&self, score: &CompositeScore) -> Result<()> {
        self.scores
            .entry(score.symbol.clone())
            .or_default()
            .insert(score.as_of, score.clone());
        Ok(())
    }

    async fn previous_score(&self, symbol: &str, before: Date) -> Result<Option<CompositeScore>> {
        Ok(self.scores.get(symbol).and_then(|h| {
            h.range(..before).next_back().map(|(_, s)| s.clone())
        }))
    }

    async fn latest(&self, symbol: &str) -> Result<Option<CompositeScore>> {
        Ok(self
            .scores
            .get(symbol)
            .and_then(|h| h.values().next_back().cloned()))
    }

    async fn record_reset(&self, event: &ResetEvent) -> Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut event = event.clone();
        event.id = Some(id);
        self.resets.insert(id, event);
        Ok(id)
    }

    async fn pending_resets(&self, symbol: &str, as_of: Date) -> Result<Vec<ResetEvent>> {
        let mut pending: Vec<ResetEvent> = self
            .resets
            .iter()
            .filter(|e| e.symbol == symbol && e.is_pending(as_of))
            .map(|e| e.value().clone())
            .collect();
        pending.sort_by_key(|e| e.id);
        Ok(pending)
    }

    async fn mark_resets_consumed(&self, ids: &[i64], as_of: Date) -> Result<()> {
        for id in ids {
            let mut event = self
                .resets
                .get_mut(id)
                .ok_or_else(|| RondaError::Store(format!("unknown reset event {id}")))?;
            if event.consumed_on.is_none() {
                event.consumed_on = Some(as_of);
            }
        }
        Ok(())
    }
}
