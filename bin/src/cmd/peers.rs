//! Peer command implementation.

use std::path::Path;

use anyhow::{Result, anyhow};
use ronda_engine::{EngineConfig, Peer, PeerSimilarityEngine};

use crate::{Format, data};

/// Print the nearest same-sector peers of `symbol`.
pub(crate) fn show_peers(
    config: &EngineConfig,
    symbol: &str,
    path: &Path,
    date: Option<&str>,
    count: Option<usize>,
    format: Format,
) -> Result<()> {
    let as_of = data::date_or_today(date)?;
    let universe = data::load_snapshots(path)?.as_of(as_of);
    let target = universe
        .iter()
        .find(|s| s.symbol() == symbol)
        .ok_or_else(|| anyhow!("no active snapshot for {symbol} on or before {as_of}"))?;

    let mut peer_config = config.peers.clone();
    if let Some(count) = count {
        peer_config.count = count;
    }
    peer_config.validate()?;

    let peers = PeerSimilarityEngine::new(peer_config).find_peers(target, &universe);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&peers)?),
        Format::Text => print_peers(symbol, target.sector(), &peers),
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn print_peers(symbol: &str, sector: &str, peers: &[Peer]) {
    println!("\nPeers of {symbol} in {sector}\n");
    if peers.is_empty() {
        println!("No active peers in sector.\n");
        return;
    }

    println!(
        "{:<10} {:>10} {:>10} {:>16} {:>8} {:>10}",
        "Symbol", "Distance", "Cap ratio", "Market cap", "P/E", "Growth %"
    );
    println!("{}", "─".repeat(70));
    for p in peers {
        println!(
            "{:<10} {:>10.4} {:>10} {:>16} {:>8} {:>10}",
            p.symbol,
            p.distance,
            fmt_opt(p.cap_ratio, 2),
            fmt_opt(p.market_cap, 0),
            fmt_opt(p.pe_ratio, 1),
            fmt_opt(p.revenue_growth, 1)
        );
    }
    println!();
}
