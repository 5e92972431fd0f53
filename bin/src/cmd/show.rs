//! Show command implementation.

use anyhow::{Result, bail};
use ronda_engine::EngineConfig;
use ronda_traits::{CompositeScore, ScoreStore};

use crate::{Format, data};

/// Print the latest persisted score for `symbol`.
pub(crate) async fn show_score(config: &EngineConfig, symbol: &str, format: Format) -> Result<()> {
    let store = data::open_store(config).await?;
    let Some(score) = store.latest(symbol).await? else {
        bail!("no persisted score for {symbol}");
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&score)?),
        Format::Text => print_score(&score),
    }
    Ok(())
}

fn print_score(score: &CompositeScore) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{} ({}) as of {}", score.symbol, score.sector, score.as_of);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Score:        {:.1} ({})", score.score, score.rating.as_str());
    println!("Raw score:    {:.1}", score.raw_score);
    println!(
        "Lifecycle:    {} (confidence {:.2})",
        score.lifecycle.as_str(),
        score.lifecycle_confidence
    );
    println!(
        "Completeness: {:.1}% ({})",
        score.completeness,
        score.confidence.as_str()
    );
    println!("Transition:   {}", score.transition.as_str());
    println!("Config:       {}", score.config_version);
    println!();

    println!("{:<26} {:>8} {:>8} {:<20}", "Factor", "Score", "Weight", "Method");
    println!("{}", "─".repeat(64));
    for factor in &score.factor_scores {
        let weight = score.weights.get(&factor.factor).copied().unwrap_or(0.0);
        println!(
            "{:<26} {:>8.1} {:>8.3} {:<20}",
            factor.factor.as_str(),
            factor.value,
            weight,
            factor.method.as_str()
        );
        if !factor.missing.is_empty() {
            let missing: Vec<&str> = factor.missing.iter().map(|m| m.as_str()).collect();
            println!("    missing: {}", missing.join(", "));
        }
    }
    println!();
}
