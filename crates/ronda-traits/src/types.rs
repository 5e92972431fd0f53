//! Common types used throughout the Ronda engine.
//!
//! This module defines the per-security inputs consumed by a scoring run and
//! the reset events that interrupt score smoothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RondaError;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A market symbol identifier, e.g. "AAPL".
pub type Symbol = String;

/// Minimum dividend yield (percent) for a security to count as a dividend payer.
pub const DEFAULT_MIN_DIVIDEND_YIELD: f64 = 0.5;

/// A tracked security.
///
/// Securities are long-lived: they are deactivated, never deleted. The
/// lifecycle stage is derived on every run and carried on the composite score
/// rather than stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Ticker symbol, unique across the universe.
    pub symbol: Symbol,
    /// Sector used as the peer population for percentile ranking.
    pub sector: String,
    /// Industry classification (informational).
    #[serde(default)]
    pub industry: String,
    /// Inactive securities are skipped by scoring runs.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl Security {
    /// Create an active security.
    pub fn new(symbol: impl Into<Symbol>, sector: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sector: sector.into(),
            industry: String::new(),
            active: true,
        }
    }
}

impl Default for Security {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

/// Raw inputs for one security on one as-of date.
///
/// Snapshots are immutable once written and superseded by later snapshots.
/// Every metric is optional; calculators score whatever is present.
/// Percentages are expressed in percent units (12.5 means 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    /// The security this snapshot describes.
    #[serde(flatten)]
    pub security: Security,
    /// As-of date of the snapshot.
    pub as_of: Date,

    /// Last close price.
    pub price: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,

    /// Price to earnings.
    pub pe_ratio: Option<f64>,
    /// Price to book.
    pub pb_ratio: Option<f64>,
    /// Price to sales.
    pub ps_ratio: Option<f64>,

    /// Net margin (%).
    pub net_margin: Option<f64>,
    /// Operating margin (%).
    pub operating_margin: Option<f64>,
    /// Return on equity (%).
    pub roe: Option<f64>,
    /// Return on assets (%).
    pub roa: Option<f64>,

    /// Debt to equity.
    pub debt_to_equity: Option<f64>,
    /// EBIT over interest expense.
    pub interest_coverage: Option<f64>,
    /// Current assets over current liabilities.
    pub current_ratio: Option<f64>,
    /// Quick assets over current liabilities.
    pub quick_ratio: Option<f64>,

    /// Quarterly revenue, most recent first.
    pub revenue_quarters: Vec<f64>,
    /// Quarterly diluted EPS, most recent first.
    pub eps_quarters: Vec<f64>,

    /// 1-month total return (%).
    pub return_1m: Option<f64>,
    /// 3-month total return (%).
    pub return_3m: Option<f64>,
    /// 6-month total return (%).
    pub return_6m: Option<f64>,
    /// 12-month total return (%).
    pub return_12m: Option<f64>,

    /// 14-day RSI.
    pub rsi: Option<f64>,
    /// MACD histogram (12, 26, 9).
    pub macd_histogram: Option<f64>,
    /// 50-day simple moving average of the close.
    pub sma_50: Option<f64>,

    /// Analysts rating buy or strong buy.
    pub analyst_buy: Option<u32>,
    /// Analysts rating hold.
    pub analyst_hold: Option<u32>,
    /// Analysts rating sell or strong sell.
    pub analyst_sell: Option<u32>,
    /// Mean analyst price target.
    pub price_target: Option<f64>,

    /// Net shares bought by insiders over the last 90 days (negative for selling).
    pub insider_net_shares: Option<f64>,
    /// Net value bought by insiders over the last 90 days.
    pub insider_net_value: Option<f64>,

    /// Number of institutional holders.
    pub institutional_holders: Option<u32>,
    /// Shares held by institutions at the latest filing.
    pub institutional_shares: Option<f64>,
    /// Shares held by institutions one quarter earlier.
    pub institutional_shares_prior: Option<f64>,

    /// Average article sentiment on a 0-100 scale.
    pub news_sentiment: Option<f64>,
    /// Articles in the sentiment window.
    pub news_articles: Option<u32>,
    /// Articles classified positive.
    pub news_positive: Option<u32>,
    /// Articles classified negative.
    pub news_negative: Option<u32>,

    /// Trailing dividend yield (%).
    pub dividend_yield: Option<f64>,
    /// Dividends over earnings (%).
    pub payout_ratio: Option<f64>,
    /// Annualized dividend growth (%).
    pub dividend_growth: Option<f64>,
    /// Consecutive years of dividend increases.
    pub dividend_streak: Option<u32>,
}

impl MetricSnapshot {
    /// Create an empty snapshot for an active security.
    pub fn new(symbol: impl Into<Symbol>, sector: impl Into<String>, as_of: Date) -> Self {
        Self {
            security: Security::new(symbol, sector),
            as_of,
            ..Default::default()
        }
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.security.symbol
    }

    /// Sector of the security.
    pub fn sector(&self) -> &str {
        &self.security.sector
    }

    /// Whether the security pays a dividend of at least `min_yield` percent.
    #[must_use]
    pub fn pays_dividend(&self, min_yield: f64) -> bool {
        self.dividend_yield
            .is_some_and(|y| y.is_finite() && y >= min_yield)
    }
}

/// Kind of event that invalidates score smoothing continuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetKind {
    /// A new earnings release was filed.
    EarningsRelease,
    /// Bankruptcy filing.
    Bankruptcy,
    /// Delisting notice.
    Delisting,
    /// Major restructuring.
    Restructuring,
    /// An analyst upgrade or downgrade.
    AnalystRatingChange,
    /// Company guidance update.
    GuidanceUpdate,
    /// Acquisition or merger announcement.
    Acquisition,
}

impl ResetKind {
    /// All reset kinds.
    pub const ALL: [Self; 7] = [
        Self::EarningsRelease,
        Self::Bankruptcy,
        Self::Delisting,
        Self::Restructuring,
        Self::AnalystRatingChange,
        Self::GuidanceUpdate,
        Self::Acquisition,
    ];

    /// Stable identifier used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EarningsRelease => "earnings_release",
            Self::Bankruptcy => "bankruptcy",
            Self::Delisting => "delisting",
            Self::Restructuring => "restructuring",
            Self::AnalystRatingChange => "analyst_rating_change",
            Self::GuidanceUpdate => "guidance_update",
            Self::Acquisition => "acquisition",
        }
    }
}

impl fmt::Display for ResetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetKind {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| RondaError::InvalidData(format!("unknown reset kind: {s}")))
    }
}

/// An externally recorded event that suppresses smoothing for the next run.
///
/// Reset events are written by the ingestion layer and consumed by the first
/// run on or after `occurred_on`, once the score they affected is persisted.
/// Reruns of that date still see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetEvent {
    /// Store-assigned identifier, `None` until recorded.
    pub id: Option<i64>,
    /// Affected security.
    pub symbol: Symbol,
    /// What happened.
    pub kind: ResetKind,
    /// When it happened.
    pub occurred_on: Date,
    /// Run date that consumed the event.
    pub consumed_on: Option<Date>,
}

impl ResetEvent {
    /// A new, unrecorded event.
    pub fn new(symbol: impl Into<Symbol>, kind: ResetKind, occurred_on: Date) -> Self {
        Self {
            id: None,
            symbol: symbol.into(),
            kind,
            occurred_on,
            consumed_on: None,
        }
    }

    /// Whether the event applies to a run on `date`: not yet consumed, or
    /// consumed by a run on that same date.
    #[must_use]
    pub fn is_pending(&self, date: Date) -> bool {
        self.occurred_on <= date && self.consumed_on.is_none_or(|consumed| consumed == date)
    }
}
