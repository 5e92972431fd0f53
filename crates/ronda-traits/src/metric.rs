//! Normalized metric identities.
//!
//! A [`Metric`] is a single sub-metric ranked by the sector percentile
//! normalizer. Its direction (`lower_is_better`) is a fixed property of the
//! metric, never a per-call flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Factor;

/// Absolute-benchmark scoring curve used when a sector sample is too small.
///
/// The curve maps a raw value to `clamp(50 + slope * (value - center), 0, 100)`.
/// Direction adjustment is applied afterwards, exactly as for percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCurve {
    /// Raw value that scores 50.
    pub center: f64,
    /// Score points per unit of the raw value.
    pub slope: f64,
}

impl BenchmarkCurve {
    /// Create a curve.
    #[must_use]
    pub const fn new(center: f64, slope: f64) -> Self {
        Self { center, slope }
    }

    /// Score a raw value on the 0-100 scale, before direction adjustment.
    #[must_use]
    pub fn score(&self, value: f64) -> f64 {
        (50.0 + self.slope * (value - self.center)).clamp(0.0, 100.0)
    }
}

/// A sub-metric that feeds one factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Metric {
    PriceToEarnings,
    PriceToBook,
    PriceToSales,
    PriceEarningsToGrowth,
    RevenueGrowth,
    EpsGrowth,
    NetMargin,
    OperatingMargin,
    ReturnOnEquity,
    ReturnOnAssets,
    DebtToEquity,
    InterestCoverage,
    CurrentRatio,
    QuickRatio,
    Return1m,
    Return3m,
    Return6m,
    Return12m,
    Rsi,
    MacdHistogram,
    PriceVsSma50,
    AnalystRating,
    TargetUpside,
    InsiderNetSharesPct,
    InsiderNetValuePct,
    InstitutionalOwnershipPct,
    InstitutionalChangePct,
    InstitutionalHolders,
    NewsSentiment,
    NewsNetPositive,
    DividendYield,
    PayoutDeviation,
    DividendGrowth,
    DividendStreak,
}

impl Metric {
    /// Every metric, in canonical order.
    pub const ALL: [Self; 34] = [
        Self::PriceToEarnings,
        Self::PriceToBook,
        Self::PriceToSales,
        Self::PriceEarningsToGrowth,
        Self::RevenueGrowth,
        Self::EpsGrowth,
        Self::NetMargin,
        Self::OperatingMargin,
        Self::ReturnOnEquity,
        Self::ReturnOnAssets,
        Self::DebtToEquity,
        Self::InterestCoverage,
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::Return1m,
        Self::Return3m,
        Self::Return6m,
        Self::Return12m,
        Self::Rsi,
        Self::MacdHistogram,
        Self::PriceVsSma50,
        Self::AnalystRating,
        Self::TargetUpside,
        Self::InsiderNetSharesPct,
        Self::InsiderNetValuePct,
        Self::InstitutionalOwnershipPct,
        Self::InstitutionalChangePct,
        Self::InstitutionalHolders,
        Self::NewsSentiment,
        Self::NewsNetPositive,
        Self::DividendYield,
        Self::PayoutDeviation,
        Self::DividendGrowth,
        Self::DividendStreak,
    ];

    /// Stable identifier used in metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceToEarnings => "pe_ratio",
            Self::PriceToBook => "pb_ratio",
            Self::PriceToSales => "ps_ratio",
            Self::PriceEarningsToGrowth => "peg_ratio",
            Self::RevenueGrowth => "revenue_growth_yoy",
            Self::EpsGrowth => "eps_growth_yoy",
            Self::NetMargin => "net_margin",
            Self::OperatingMargin => "operating_margin",
            Self::ReturnOnEquity => "roe",
            Self::ReturnOnAssets => "roa",
            Self::DebtToEquity => "debt_to_equity",
            Self::InterestCoverage => "interest_coverage",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::Return1m => "return_1m",
            Self::Return3m => "return_3m",
            Self::Return6m => "return_6m",
            Self::Return12m => "return_12m",
            Self::Rsi => "rsi",
            Self::MacdHistogram => "macd_histogram",
            Self::PriceVsSma50 => "price_vs_sma50",
            Self::AnalystRating => "analyst_rating",
            Self::TargetUpside => "target_upside",
            Self::InsiderNetSharesPct => "insider_net_shares_pct",
            Self::InsiderNetValuePct => "insider_net_value_pct",
            Self::InstitutionalOwnershipPct => "institutional_ownership_pct",
            Self::InstitutionalChangePct => "institutional_change_pct",
            Self::InstitutionalHolders => "institutional_holders",
            Self::NewsSentiment => "news_sentiment",
            Self::NewsNetPositive => "news_net_positive",
            Self::DividendYield => "dividend_yield",
            Self::PayoutDeviation => "payout_deviation",
            Self::DividendGrowth => "dividend_growth",
            Self::DividendStreak => "dividend_streak",
        }
    }

    /// Whether a lower raw value is better for an investor.
    ///
    /// Percentiles of these metrics are inverted (`100 - p`) so that a higher
    /// output always means better.
    #[must_use]
    pub const fn lower_is_better(&self) -> bool {
        matches!(
            self,
            Self::PriceToEarnings
                | Self::PriceToBook
                | Self::PriceToSales
                | Self::PriceEarningsToGrowth
                | Self::DebtToEquity
                | Self::PayoutDeviation
        )
    }

    /// The factor this metric feeds.
    #[must_use]
    pub const fn factor(&self) -> Factor {
        match self {
            Self::PriceToEarnings
            | Self::PriceToBook
            | Self::PriceToSales
            | Self::PriceEarningsToGrowth => Factor::Value,
            Self::RevenueGrowth | Self::EpsGrowth => Factor::Growth,
            Self::NetMargin
            | Self::OperatingMargin
            | Self::ReturnOnEquity
            | Self::ReturnOnAssets => Factor::Profitability,
            Self::DebtToEquity
            | Self::InterestCoverage
            | Self::CurrentRatio
            | Self::QuickRatio => Factor::FinancialHealth,
            Self::Return1m | Self::Return3m | Self::Return6m | Self::Return12m => {
                Factor::Momentum
            }
            Self::Rsi | Self::MacdHistogram | Self::PriceVsSma50 => Factor::Technical,
            Self::AnalystRating | Self::TargetUpside => Factor::AnalystConsensus,
            Self::InsiderNetSharesPct | Self::InsiderNetValuePct => Factor::InsiderActivity,
            Self::InstitutionalOwnershipPct
            | Self::InstitutionalChangePct
            | Self::InstitutionalHolders => Factor::InstitutionalOwnership,
            Self::NewsSentiment | Self::NewsNetPositive => Factor::NewsSentiment,
            Self::DividendYield
            | Self::PayoutDeviation
            | Self::DividendGrowth
            | Self::DividendStreak => Factor::DividendQuality,
        }
    }

    /// Default absolute-benchmark curve for the small-sample fallback.
    ///
    /// Centers sit near broad-market medians rather than fixed textbook
    /// constants; every curve can be overridden through configuration.
    #[must_use]
    pub const fn default_benchmark(&self) -> BenchmarkCurve {
        match self {
            Self::PriceToEarnings => BenchmarkCurve::new(22.0, 2.0),
            Self::PriceToBook => BenchmarkCurve::new(3.5, 12.0),
            Self::PriceToSales => BenchmarkCurve::new(3.0, 12.0),
            Self::PriceEarningsToGrowth => BenchmarkCurve::new(1.5, 25.0),
            Self::RevenueGrowth => BenchmarkCurve::new(5.0, 2.5),
            Self::EpsGrowth => BenchmarkCurve::new(5.0, 1.0),
            Self::NetMargin => BenchmarkCurve::new(10.0, 4.0),
            Self::OperatingMargin => BenchmarkCurve::new(15.0, 3.0),
            Self::ReturnOnEquity => BenchmarkCurve::new(12.0, 3.0),
            Self::ReturnOnAssets => BenchmarkCurve::new(5.0, 8.0),
            Self::DebtToEquity => BenchmarkCurve::new(1.0, 40.0),
            Self::InterestCoverage => BenchmarkCurve::new(5.0, 8.0),
            Self::CurrentRatio => BenchmarkCurve::new(1.5, 40.0),
            Self::QuickRatio => BenchmarkCurve::new(1.0, 40.0),
            Self::Return1m => BenchmarkCurve::new(0.0, 5.0),
            Self::Return3m => BenchmarkCurve::new(0.0, 3.0),
            Self::Return6m => BenchmarkCurve::new(0.0, 2.0),
            Self::Return12m => BenchmarkCurve::new(0.0, 1.5),
            Self::Rsi => BenchmarkCurve::new(50.0, 2.5),
            Self::MacdHistogram => BenchmarkCurve::new(0.0, 10.0),
            Self::PriceVsSma50 => BenchmarkCurve::new(0.0, 5.0),
            Self::AnalystRating => BenchmarkCurve::new(50.0, 1.0),
            Self::TargetUpside => BenchmarkCurve::new(0.0, 2.5),
            Self::InsiderNetSharesPct => BenchmarkCurve::new(0.0, 100.0),
            Self::InsiderNetValuePct => BenchmarkCurve::new(0.0, 100.0),
            Self::InstitutionalOwnershipPct => BenchmarkCurve::new(50.0, 1.0),
            Self::InstitutionalChangePct => BenchmarkCurve::new(0.0, 5.0),
            Self::InstitutionalHolders => BenchmarkCurve::new(100.0, 0.5),
            Self::NewsSentiment => BenchmarkCurve::new(50.0, 1.0),
            Self::NewsNetPositive => BenchmarkCurve::new(0.0, 0.5),
            Self::DividendYield => BenchmarkCurve::new(2.5, 15.0),
            Self::PayoutDeviation => BenchmarkCurve::new(20.0, 2.5),
            Self::DividendGrowth => BenchmarkCurve::new(4.0, 5.0),
            Self::DividendStreak => BenchmarkCurve::new(10.0, 4.0),
        }
    }

    /// All metrics feeding `factor`.
    pub fn for_factor(factor: Factor) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |m| m.factor() == factor)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction() {
        assert!(Metric::PriceToEarnings.lower_is_better());
        assert!(Metric::DebtToEquity.lower_is_better());
        assert!(!Metric::ReturnOnEquity.lower_is_better());
        assert!(!Metric::NetMargin.lower_is_better());
        assert!(!Metric::CurrentRatio.lower_is_better());
    }

    #[test]
    fn test_benchmark_curve_clamps() {
        let curve = BenchmarkCurve::new(10.0, 5.0);
        assert_relative_eq!(curve.score(10.0), 50.0);
        assert_relative_eq!(curve.score(14.0), 70.0);
        assert_relative_eq!(curve.score(1000.0), 100.0);
        assert_relative_eq!(curve.score(-1000.0), 0.0);
    }

    #[test]
    fn test_every_factor_has_metrics() {
        for factor in Factor::ALL {
            let n = Metric::for_factor(factor).count();
            assert!((2..=4).contains(&n), "{factor} has {n} metrics");
        }
    }

    #[test]
    fn test_benchmark_slopes_positive() {
        for metric in Metric::ALL {
            assert!(metric.default_benchmark().slope > 0.0, "{metric}");
        }
    }
}
