//! Reset command implementation.

use anyhow::Result;
use ronda_engine::EngineConfig;
use ronda_traits::{ResetEvent, ResetKind, ScoreStore};

use crate::data;

/// Record a reset event for `symbol`.
pub(crate) async fn record_reset(
    config: &EngineConfig,
    symbol: &str,
    kind: &str,
    date: Option<&str>,
) -> Result<()> {
    let kind: ResetKind = kind.parse()?;
    let occurred_on = data::date_or_today(date)?;
    let store = data::open_store(config).await?;

    let event = ResetEvent::new(symbol, kind, occurred_on);
    let id = store.record_reset(&event).await?;
    tracing::info!(symbol, kind = kind.as_str(), %occurred_on, id, "reset event recorded");
    println!("Recorded {kind} reset for {symbol} on {occurred_on} (id {id})");
    Ok(())
}
