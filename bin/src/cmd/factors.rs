//! Factor listing command implementation.

use ronda_signals::registry::{available_factors, factors_by_category};
use ronda_signals::{FactorCategory, FactorInfo};

const CATEGORIES: [(FactorCategory, &str); 5] = [
    (FactorCategory::Fundamental, "Fundamental"),
    (FactorCategory::Market, "Market"),
    (FactorCategory::SmartMoney, "Smart Money"),
    (FactorCategory::Sentiment, "Sentiment"),
    (FactorCategory::Income, "Income"),
];

/// List scoring factors, optionally filtered by category.
pub(crate) fn list_factors(category: Option<&str>, verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Scoring Factors                           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for (cat, cat_name) in CATEGORIES {
        if let Some(filter) = category
            && !matches_category(cat_name, filter)
        {
            continue;
        }

        let infos = factors_by_category(&cat);
        if infos.is_empty() {
            continue;
        }

        println!("{}: {}", cat_name, cat.description());
        println!("{}", "-".repeat(60));
        for info in &infos {
            print_factor(info, verbose);
        }
        println!();
    }

    if !verbose {
        println!(
            "{} factors. Use --verbose for sub-metrics.\n",
            available_factors().len()
        );
    }
}

fn matches_category(name: &str, filter: &str) -> bool {
    let normalize = |s: &str| s.to_lowercase().replace([' ', '_', '-'], "");
    normalize(name).contains(&normalize(filter))
}

fn print_factor(info: &FactorInfo, verbose: bool) {
    let payers = if info.payers_only { " (dividend payers only)" } else { "" };
    if verbose {
        println!("  {:25} - {}{}", info.factor.as_str(), info.description, payers);
        let metrics: Vec<&str> = info.metrics.iter().map(|m| m.as_str()).collect();
        println!("  {:25}   metrics: {}", "", metrics.join(", "));
    } else {
        println!("  {}{}", info.factor.as_str(), payers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_category() {
        assert!(matches_category("Smart Money", "smart_money"));
        assert!(matches_category("Smart Money", "smart"));
        assert!(matches_category("Fundamental", "FUND"));
        assert!(!matches_category("Income", "market"));
    }

    #[test]
    fn test_categories_cover_registry() {
        let listed: usize = CATEGORIES
            .iter()
            .map(|(cat, _)| factors_by_category(cat).len())
            .sum();
        assert_eq!(listed, available_factors().len());
    }
}
