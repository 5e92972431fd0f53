//! Factor identities and weight slots.
//!
//! Factors are a closed set. Weight profiles are keyed by [`WeightSlot`], which
//! groups the three ownership/opinion factors into the Smart Money meta-factor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RondaError;

/// A scored sub-factor of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Valuation multiples ranked within sector.
    Value,
    /// Year-over-year revenue and EPS growth.
    Growth,
    /// Margins and returns on capital.
    Profitability,
    /// Leverage and liquidity.
    FinancialHealth,
    /// Trailing price returns.
    Momentum,
    /// Sell-side ratings and price targets.
    AnalystConsensus,
    /// Net insider buying relative to company size.
    InsiderActivity,
    /// Institutional ownership level and flow.
    InstitutionalOwnership,
    /// Aggregated news sentiment.
    NewsSentiment,
    /// RSI, MACD and trend.
    Technical,
    /// Dividend yield, sustainability and growth. Expected only for payers.
    DividendQuality,
}

impl Factor {
    /// Every factor, in canonical order.
    pub const ALL: [Self; 11] = [
        Self::Value,
        Self::Growth,
        Self::Profitability,
        Self::FinancialHealth,
        Self::Momentum,
        Self::AnalystConsensus,
        Self::InsiderActivity,
        Self::InstitutionalOwnership,
        Self::NewsSentiment,
        Self::Technical,
        Self::DividendQuality,
    ];

    /// Factors expected for every security.
    pub const CORE: [Self; 10] = [
        Self::Value,
        Self::Growth,
        Self::Profitability,
        Self::FinancialHealth,
        Self::Momentum,
        Self::AnalystConsensus,
        Self::InsiderActivity,
        Self::InstitutionalOwnership,
        Self::NewsSentiment,
        Self::Technical,
    ];

    /// Fundamental factors; a minimum number must be present to score at all.
    pub const FUNDAMENTAL: [Self; 4] = [
        Self::Value,
        Self::Growth,
        Self::Profitability,
        Self::FinancialHealth,
    ];

    /// Stable identifier used in storage and metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Growth => "growth",
            Self::Profitability => "profitability",
            Self::FinancialHealth => "financial_health",
            Self::Momentum => "momentum",
            Self::AnalystConsensus => "analyst_consensus",
            Self::InsiderActivity => "insider_activity",
            Self::InstitutionalOwnership => "institutional_ownership",
            Self::NewsSentiment => "news_sentiment",
            Self::Technical => "technical",
            Self::DividendQuality => "dividend_quality",
        }
    }

    /// The weight slot this factor draws its weight from.
    #[must_use]
    pub const fn slot(&self) -> WeightSlot {
        match self {
            Self::Value => WeightSlot::Value,
            Self::Growth => WeightSlot::Growth,
            Self::Profitability => WeightSlot::Profitability,
            Self::FinancialHealth => WeightSlot::FinancialHealth,
            Self::Momentum => WeightSlot::Momentum,
            Self::AnalystConsensus | Self::InsiderActivity | Self::InstitutionalOwnership => {
                WeightSlot::SmartMoney
            }
            Self::NewsSentiment => WeightSlot::NewsSentiment,
            Self::Technical => WeightSlot::Technical,
            Self::DividendQuality => WeightSlot::DividendQuality,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factor {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| RondaError::InvalidData(format!("unknown factor: {s}")))
    }
}

/// A key of a lifecycle weight profile.
///
/// Every slot maps to exactly one factor except [`WeightSlot::SmartMoney`],
/// which is split across analyst consensus, insider activity and institutional
/// ownership by fixed internal proportions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSlot {
    /// [`Factor::Value`]
    Value,
    /// [`Factor::Growth`]
    Growth,
    /// [`Factor::Profitability`]
    Profitability,
    /// [`Factor::FinancialHealth`]
    FinancialHealth,
    /// [`Factor::Momentum`]
    Momentum,
    /// Analyst consensus, insider activity and institutional ownership.
    SmartMoney,
    /// [`Factor::NewsSentiment`]
    NewsSentiment,
    /// [`Factor::Technical`]
    Technical,
    /// [`Factor::DividendQuality`]
    DividendQuality,
}

impl WeightSlot {
    /// Every slot, in canonical order.
    pub const ALL: [Self; 9] = [
        Self::Value,
        Self::Growth,
        Self::Profitability,
        Self::FinancialHealth,
        Self::Momentum,
        Self::SmartMoney,
        Self::NewsSentiment,
        Self::Technical,
        Self::DividendQuality,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Growth => "growth",
            Self::Profitability => "profitability",
            Self::FinancialHealth => "financial_health",
            Self::Momentum => "momentum",
            Self::SmartMoney => "smart_money",
            Self::NewsSentiment => "news_sentiment",
            Self::Technical => "technical",
            Self::DividendQuality => "dividend_quality",
        }
    }

    /// Factors that draw weight from this slot.
    #[must_use]
    pub const fn members(&self) -> &'static [Factor] {
        match self {
            Self::Value => &[Factor::Value],
            Self::Growth => &[Factor::Growth],
            Self::Profitability => &[Factor::Profitability],
            Self::FinancialHealth => &[Factor::FinancialHealth],
            Self::Momentum => &[Factor::Momentum],
            Self::SmartMoney => &[
                Factor::AnalystConsensus,
                Factor::InsiderActivity,
                Factor::InstitutionalOwnership,
            ],
            Self::NewsSentiment => &[Factor::NewsSentiment],
            Self::Technical => &[Factor::Technical],
            Self::DividendQuality => &[Factor::DividendQuality],
        }
    }
}

impl fmt::Display for WeightSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
