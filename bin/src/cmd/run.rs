//! Batch run command implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use ronda_engine::{EngineConfig, Orchestrator, RunReport};

use crate::{Format, data};

/// Score every active security in a snapshot file and persist the results.
pub(crate) async fn run_scoring(
    config: &EngineConfig,
    path: &Path,
    date: Option<&str>,
    format: Format,
) -> Result<()> {
    let as_of = data::date_or_today(date)?;
    let repository = Arc::new(data::load_snapshots(path)?);
    let store = Arc::new(data::open_store(config).await?);

    let orchestrator = Orchestrator::new(config, repository, store);
    let cancel = orchestrator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let report = orchestrator.run(as_of).await?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Scoring Run                             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Date:     {}", report.as_of);
    println!("Universe: {}", report.universe);
    println!("Scored:   {}", report.scored.len());
    println!("Skipped:  {}", report.skipped.len());
    println!("Failed:   {}", report.failed.len());
    println!("Elapsed:  {} ms", report.elapsed_ms);
    println!();

    if !report.scored.is_empty() {
        println!(
            "{:<10} {:>8} {:>8} {:>12} {:<12} {:<12}",
            "Symbol", "Score", "Raw", "Complete %", "Rating", "Transition"
        );
        println!("{}", "─".repeat(68));
        for s in &report.scored {
            println!(
                "{:<10} {:>8.1} {:>8.1} {:>12.1} {:<12} {:<12}",
                s.symbol,
                s.score,
                s.raw_score,
                s.completeness,
                s.rating.as_str(),
                s.transition.as_str()
            );
        }
        println!();
    }

    for s in &report.skipped {
        println!("skipped {:<10} {}", s.symbol, s.reason);
    }
    for f in &report.failed {
        println!("failed  {:<10} {} (attempts: {})", f.symbol, f.error, f.attempts);
    }
}
