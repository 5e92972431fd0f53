//! Explain command implementation.

use anyhow::{Result, bail};
use ronda_engine::{EngineConfig, FactorChange, ScoreExplainer, ScoreExplanation};

use crate::{Format, data};

/// Print why the latest score for `symbol` moved since the one before it.
pub(crate) async fn explain_score(
    config: &EngineConfig,
    symbol: &str,
    format: Format,
) -> Result<()> {
    let store = data::open_store(config).await?;
    let explainer = ScoreExplainer::new(config.explainer.clone());
    let Some(explanation) = explainer.explain_latest(&store, symbol).await? else {
        bail!("no persisted score for {symbol}");
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&explanation)?),
        Format::Text => print_explanation(&explanation),
    }
    Ok(())
}

fn print_explanation(explanation: &ScoreExplanation) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{} as of {}", explanation.symbol, explanation.as_of);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("{}\n", explanation.summary);
    match (explanation.previous_score, explanation.previous_as_of) {
        (Some(previous), Some(date)) => println!(
            "Score:        {:.1} -> {:.1} (since {date})",
            previous, explanation.current_score
        ),
        _ => println!("Score:        {:.1} (first score)", explanation.current_score),
    }
    println!("Transition:   {}", explanation.transition.as_str());
    println!(
        "Completeness: {:.1}% ({})",
        explanation.completeness,
        explanation.confidence.as_str()
    );

    if !explanation.reasons.is_empty() {
        println!("\n{:<26} {:>8} {:>8} {:>8}  Why", "Factor", "Delta", "Weight", "Impact");
        println!("{}", "─".repeat(80));
        for change in &explanation.reasons {
            println!("{}", reason_line(change));
        }
    }

    let missing: Vec<_> = explanation.factors.iter().filter(|s| !s.available).collect();
    if !missing.is_empty() {
        println!("\nMissing factors:");
        for status in missing {
            println!(
                "  {:<24} {}",
                status.factor.as_str(),
                status.reason.as_deref().unwrap_or("-")
            );
        }
    }
    println!();
}

fn reason_line(change: &FactorChange) -> String {
    format!(
        "{:<26} {:>+8.1} {:>8.3} {:>+8.2}  {}",
        change.factor.as_str(),
        change.delta,
        change.weight,
        change.contribution,
        change.explanation
    )
}
