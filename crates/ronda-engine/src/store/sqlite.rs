use std::str::FromStr;

use async_trait::async_trait;
use ronda_traits::{
    CompositeScore, Date, FactorScore, ResetEvent, Result, RondaError, ScoreStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn store_err(e: sqlx::Error) -> RondaError {
    RondaError::Store(e.to_string())
}

fn encode_date(date: Date) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn decode_date(text: &str) -> Result<Date> {
    Date::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| RondaError::Store(format!("bad stored date {text:?}: {e}")))
}

/// Stored composite row with string-encoded dates and JSON columns.
#[derive(Debug, FromRow)]
struct CompositeRow {
    symbol: String,
    as_of: String,
    sector: String,
    score: f64,
    raw_score: f64,
    lifecycle: String,
    lifecycle_confidence: f64,
    rating: String,
    weights: String,
    completeness: f64,
    confidence: String,
    transition: String,
    metadata: String,
    config_version: String,
}

impl CompositeRow {
    fn into_score(self, factor_scores: Vec<FactorScore>) -> Result<CompositeScore> {
        Ok(CompositeScore {
            symbol: self.symbol,
            sector: self.sector,
            as_of: decode_date(&self.as_of)?,
            score: self.score,
            raw_score: self.raw_score,
            lifecycle: self.lifecycle.parse()?,
            lifecycle_confidence: self.lifecycle_confidence,
            rating: self.rating.parse()?,
            weights: serde_json::from_str(&self.weights)?,
            completeness: self.completeness,
            confidence: self.confidence.parse()?,
            transition: self.transition.parse()?,
            factor_scores,
            metadata: serde_json::from_str(&self.metadata)?,
            config_version: self.config_version,
        })
    }
}

#[derive(Debug, FromRow)]
struct FactorRow {
    factor: String,
    value: f64,
    method: String,
    components: String,
    missing: String,
}

impl FactorRow {
    fn into_score(self) -> Result<FactorScore> {
        Ok(FactorScore {
            factor: self.factor.parse()?,
            value: self.value,
            method: self.method.parse()?,
            components: serde_json::from_str(&self.components)?,
            missing: serde_json::from_str(&self.missing)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResetRow {
    id: i64,
    symbol: String,
    kind: String,
    occurred_on: String,
    consumed_on: Option<String>,
}

impl ResetRow {
    fn into_event(self) -> Result<ResetEvent> {
        Ok(ResetEvent {
            id: Some(self.id),
            symbol: self.symbol,
            kind: self.kind.parse()?,
            occurred_on: decode_date(&self.occurred_on)?,
            consumed_on: self.consumed_on.as_deref().map(decode_date).transpose()?,
        })
    }
}

/// SQLite [`ScoreStore`] holding the composite read model.
///
/// Tables: `composite_scores` keyed by `(symbol, as_of)`, `factor_scores`
/// keyed by `(symbol, as_of, factor)` and `reset_events`.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::SqliteScoreStore;
///
/// let store = SqliteScoreStore::connect("sqlite://ronda.db").await?;
/// let latest = store.latest("AAPL").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteScoreStore {
    pool: SqlitePool,
}

impl SqliteScoreStore {
    /// Wrap an existing pool. The schema must already be migrated.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url` and migrate it.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(store_err)?
            .create_if_missing(true);
        // Each in-memory connection is its own database
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(store_err)?;

        let store = Self::new(pool);
        store.migrate().await?;
        tracing::info!(url, "score store ready");
        Ok(store)
    }

    /// A fresh in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RondaError::Store(format!("migration failed: {e}")))
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn factor_scores(&self, symbol: &str, as_of: &str) -> Result<Vec<FactorScore>> {
        let rows: Vec<FactorRow> = sqlx::query_as(
            r#"
            SELECT factor, value, method, components, missing
            FROM factor_scores
            WHERE symbol = ? AND as_of = ?
            "#,
        )
        .bind(symbol)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut scores = rows
            .into_iter()
            .map(FactorRow::into_score)
            .collect::<Result<Vec<_>>>()?;
        scores.sort_by_key(|s| s.factor);
        Ok(scores)
    }

    async fn load(&self, row: Option<CompositeRow>) -> Result<Option<CompositeScore>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let factors = self.factor_scores(&row.symbol, &row.as_of).await?;
        row.into_score(factors).map(Some)
    }
}

const SELECT_COMPOSITE: &str = r#"
    SELECT symbol, as_of, sector, score, raw_score, lifecycle, lifecycle_confidence,
           rating, weights, completeness, confidence, transition, metadata, config_version
    FROM composite_scores
"#;

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    async fn save(&self, score: &CompositeScore) -> Result<()> {
        let as_of = encode_date(score.as_of);
        let weights = serde_json::to_string(&score.weights)?;
        let metadata = serde_json::to_string(&score.metadata)?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO composite_scores (
                symbol, as_of, sector, score, raw_score, lifecycle, lifecycle_confidence,
                rating, weights, completeness, confidence, transition, metadata, config_version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&score.symbol)
        .bind(&as_of)
        .bind(&score.sector)
        .bind(score.score)
        .bind(score.raw_score)
        .bind(score.lifecycle.as_str())
        .bind(score.lifecycle_confidence)
        .bind(score.rating.as_str())
        .bind(&weights)
        .bind(score.completeness)
        .bind(score.confidence.as_str())
        .bind(score.transition.as_str())
        .bind(&metadata)
        .bind(&score.config_version)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query("DELETE FROM factor_scores WHERE symbol = ? AND as_of = ?")
            .bind(&score.symbol)
            .bind(&as_of)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        for factor in &score.factor_scores {
            sqlx::query(
                r#"
                INSERT INTO factor_scores (symbol, as_of, factor, value, method, components, missing)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&score.symbol)
            .bind(&as_of)
            .bind(factor.factor.as_str())
            .bind(factor.value)
            .bind(factor.method.as_str())
            .bind(serde_json::to_string(&factor.components)?)
            .bind(serde_json::to_string(&factor.missing)?)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)
    }

    async fn previous_score(&self, symbol: &str, before: Date) -> Result<Option<CompositeScore>> {
        let sql = format!("{SELECT_COMPOSITE} WHERE symbol = ? AND as_of < ? ORDER BY as_of DESC LIMIT 1");
        let row: Option<CompositeRow> = sqlx::query_as(&sql)
        .bind(symbol)
        .bind(encode_date(before))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        self.load(row).await
    }

    async fn latest(&self, symbol: &str) -> Result<Option<CompositeScore>> {
        let sql = format!("{SELECT_COMPOSITE} WHERE symbol = ? ORDER BY as_of DESC LIMIT 1");
        let row: Option<CompositeRow> = sqlx::query_as(&sql)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        self.load(row).await
    }

    async fn record_reset(&self, event: &ResetEvent) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO reset_events (symbol, kind, occurred_on, consumed_on)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&event.symbol)
        .bind(event.kind.as_str())
        .bind(encode_date(event.occurred_on))
        .bind(event.consumed_on.map(encode_date))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(id)
    }

    async fn pending_resets(&self, symbol: &str, as_of: Date) -> Result<Vec<ResetEvent>> {
        let rows: Vec<ResetRow> = sqlx::query_as(
            r#"
            SELECT id, symbol, kind, occurred_on, consumed_on
            FROM reset_events
            WHERE symbol = ?
              AND (consumed_on IS NULL OR consumed_on = ?)
              AND occurred_on <= ?
            ORDER BY id
            "#,
        )
        .bind(symbol)
        .bind(encode_date(as_of))
        .bind(encode_date(as_of))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(ResetRow::into_event).collect()
    }

    async fn mark_resets_consumed(&self, ids: &[i64], as_of: Date) -> Result<()> {
        let consumed_on = encode_date(as_of);
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        for id in ids {
            sqlx::query(
                "UPDATE reset_events SET consumed_on = ? WHERE id = ? AND consumed_on IS NULL",
            )
            .bind(&consumed_on)
            .bind(*id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::sample_score;
    use ronda_traits::{Factor, ResetKind, StabilizerTransition};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        let score = sample_score("AAA", date(2024, 3, 29), 71.5);
        store.save(&score).await.unwrap();

        let loaded = store.latest("AAA").await.unwrap().unwrap();
        assert_eq!(loaded, score);
        assert!(store.latest("BBB").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_factor_rows() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        let mut score = sample_score("AAA", date(2024, 3, 29), 40.0);
        store.save(&score).await.unwrap();

        score.score = 45.0;
        score.transition = StabilizerTransition::Reset;
        score.factor_scores[0].value = 70.0;
        store.save(&score).await.unwrap();

        let loaded = store.latest("AAA").await.unwrap().unwrap();
        assert_eq!(loaded.score, 45.0);
        assert_eq!(loaded.transition, StabilizerTransition::Reset);
        assert_eq!(loaded.factor_scores.len(), 1);
        assert_eq!(loaded.factor(Factor::Value).unwrap().value, 70.0);
    }

    #[tokio::test]
    async fn test_previous_score() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        for (month, value) in [(1, 50.0), (2, 55.0), (3, 60.0)] {
            store
                .save(&sample_score("AAA", date(2024, month, 28), value))
                .await
                .unwrap();
        }

        let prev = store.previous_score("AAA", date(2024, 3, 28)).await.unwrap().unwrap();
        assert_eq!(prev.as_of, date(2024, 2, 28));
        assert_eq!(prev.score, 55.0);
        assert!(store.previous_score("AAA", date(2024, 1, 28)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_events() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        let first = store
            .record_reset(&ResetEvent::new("AAA", ResetKind::EarningsRelease, date(2024, 3, 1)))
            .await
            .unwrap();
        let second = store
            .record_reset(&ResetEvent::new("AAA", ResetKind::GuidanceUpdate, date(2024, 4, 1)))
            .await
            .unwrap();
        assert!(second > first);

        let pending = store.pending_resets("AAA", date(2024, 3, 29)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ResetKind::EarningsRelease);

        store.mark_resets_consumed(&[first], date(2024, 3, 29)).await.unwrap();
        let rerun = store.pending_resets("AAA", date(2024, 3, 29)).await.unwrap();
        assert_eq!(rerun.len(), 1);
        assert_eq!(rerun[0].consumed_on, Some(date(2024, 3, 29)));
        assert!(store.pending_resets("AAA", date(2024, 3, 30)).await.unwrap().is_empty());

        let later = store.pending_resets("AAA", date(2024, 4, 30)).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].id, Some(second));
    }
}
