//! Factor registry for discovering and building the factor calculators.
//!
//! This module provides metadata about every factor in the ronda-signals
//! library and builds the calculator set used by the engine.

use ronda_traits::{Factor, FactorCalculator, Metric};
use serde::{Deserialize, Serialize};

use crate::dividend::{DividendQualityConfig, DividendQualityFactor};
use crate::growth::{GrowthConfig, GrowthFactor};
use crate::momentum::{MomentumConfig, MomentumFactor, TechnicalConfig, TechnicalFactor};
use crate::quality::{
    FinancialHealthConfig, FinancialHealthFactor, ProfitabilityConfig, ProfitabilityFactor,
};
use crate::sentiment::{NewsSentimentConfig, NewsSentimentFactor};
use crate::smart_money::{
    AnalystConsensusConfig, AnalystConsensusFactor, InsiderActivityConfig, InsiderActivityFactor,
    InstitutionalOwnershipConfig, InstitutionalOwnershipFactor,
};
use crate::value::{ValueConfig, ValueFactor};

/// Factor category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorCategory {
    /// Valuation, growth, profitability and balance sheet
    Fundamental,
    /// Price trends and indicators
    Market,
    /// Analysts, insiders and institutions
    SmartMoney,
    /// News flow
    Sentiment,
    /// Shareholder payouts
    Income,
}

impl FactorCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Fundamental => "Financial statement quality and valuation",
            Self::Market => "Price momentum and technical indicators",
            Self::SmartMoney => "Positioning of analysts, insiders and institutions",
            Self::Sentiment => "Tone of recent news coverage",
            Self::Income => "Dividend yield, sustainability and growth",
        }
    }
}

/// Metadata about a factor.
#[derive(Debug, Clone, Serialize)]
pub struct FactorInfo {
    /// The factor
    pub factor: Factor,

    /// Category classification
    pub category: FactorCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Sub-metrics the factor is built from
    pub metrics: Vec<Metric>,

    /// Whether the factor is only expected for dividend payers
    pub payers_only: bool,
}

const fn category(factor: Factor) -> FactorCategory {
    match factor {
        Factor::Value | Factor::Growth | Factor::Profitability | Factor::FinancialHealth => {
            FactorCategory::Fundamental
        }
        Factor::Momentum | Factor::Technical => FactorCategory::Market,
        Factor::AnalystConsensus | Factor::InsiderActivity | Factor::InstitutionalOwnership => {
            FactorCategory::SmartMoney
        }
        Factor::NewsSentiment => FactorCategory::Sentiment,
        Factor::DividendQuality => FactorCategory::Income,
    }
}

const fn description(factor: Factor) -> &'static str {
    match factor {
        Factor::Value => "P/E, P/B, P/S and PEG ranked within sector (cheaper is better)",
        Factor::Growth => "Year-over-year revenue and EPS growth",
        Factor::Profitability => "Net and operating margins, ROE and ROA",
        Factor::FinancialHealth => "Leverage and credited liquidity, weighted equally",
        Factor::Momentum => "Trailing 1, 3, 6 and 12 month returns",
        Factor::AnalystConsensus => "Buy/hold/sell rating score and price-target upside",
        Factor::InsiderActivity => "Net insider buying relative to shares and market cap",
        Factor::InstitutionalOwnership => "Institutional ownership, flow and holder count",
        Factor::NewsSentiment => "Average sentiment and net positive article ratio",
        Factor::Technical => "RSI, MACD histogram and price versus 50-day SMA",
        Factor::DividendQuality => "Yield, payout sustainability, growth and streak",
    }
}

/// Get information about all available factors.
#[must_use]
pub fn available_factors() -> Vec<FactorInfo> {
    Factor::ALL
        .into_iter()
        .map(|factor| FactorInfo {
            factor,
            category: category(factor),
            description: description(factor),
            metrics: Metric::for_factor(factor).collect(),
            payers_only: factor == Factor::DividendQuality,
        })
        .collect()
}

/// Get all factors in a specific category.
#[must_use]
pub fn factors_by_category(category: &FactorCategory) -> Vec<FactorInfo> {
    available_factors()
        .into_iter()
        .filter(|info| &info.category == category)
        .collect()
}

/// Get information about a specific factor by name.
#[must_use]
pub fn get_factor_info(name: &str) -> Option<FactorInfo> {
    available_factors()
        .into_iter()
        .find(|info| info.factor.as_str() == name)
}

/// Configuration of every factor calculator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct CalculatorConfig {
    pub value: ValueConfig,
    pub growth: GrowthConfig,
    pub profitability: ProfitabilityConfig,
    pub financial_health: FinancialHealthConfig,
    pub momentum: MomentumConfig,
    pub technical: TechnicalConfig,
    pub analyst_consensus: AnalystConsensusConfig,
    pub insider_activity: InsiderActivityConfig,
    pub institutional_ownership: InstitutionalOwnershipConfig,
    pub news_sentiment: NewsSentimentConfig,
    pub dividend_quality: DividendQualityConfig,
}

impl CalculatorConfig {
    /// Build one calculator per factor, in canonical factor order.
    #[must_use]
    pub fn build(&self) -> Vec<Box<dyn FactorCalculator>> {
        vec![
            Box::new(ValueFactor::new(self.value.clone())),
            Box::new(GrowthFactor::new(self.growth.clone())),
            Box::new(ProfitabilityFactor::new(self.profitability.clone())),
            Box::new(FinancialHealthFactor::new(self.financial_health.clone())),
            Box::new(MomentumFactor::new(self.momentum.clone())),
            Box::new(AnalystConsensusFactor::new(self.analyst_consensus.clone())),
            Box::new(InsiderActivityFactor::new(self.insider_activity.clone())),
            Box::new(InstitutionalOwnershipFactor::new(
                self.institutional_ownership.clone(),
            )),
            Box::new(NewsSentimentFactor::new(self.news_sentiment.clone())),
            Box::new(TechnicalFactor::new(self.technical.clone())),
            Box::new(DividendQualityFactor::new(self.dividend_quality.clone())),
        ]
    }
}

/// Calculators for every factor with default configuration.
#[must_use]
pub fn default_calculators() -> Vec<Box<dyn FactorCalculator>> {
    CalculatorConfig::default().build()
}
