//! Derivation of normalized metrics from raw snapshot fields.
//!
//! The same derivation feeds both the sector distributions and the
//! security's own percentile, so every security is ranked on exactly the
//! quantity its peers were measured on.

use ronda_traits::stats::year_over_year_growth;
use ronda_traits::{DEFAULT_MIN_DIVIDEND_YIELD, Metric, MetricSnapshot};
use serde::{Deserialize, Serialize};

use crate::quality::credited_liquidity;

/// Parameters of metric derivations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Current ratio above which extra liquidity earns diminishing credit (default: 2.0)
    pub current_ratio_optimal: f64,

    /// Quick ratio above which extra liquidity earns diminishing credit (default: 1.5)
    pub quick_ratio_optimal: f64,

    /// Payout ratio (%) considered most sustainable (default: 45.0)
    pub payout_target: f64,

    /// Minimum dividend yield (%) for dividend metrics to apply (default: 0.5)
    pub min_dividend_yield: f64,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            current_ratio_optimal: 2.0,
            quick_ratio_optimal: 1.5,
            payout_target: 45.0,
            min_dividend_yield: DEFAULT_MIN_DIVIDEND_YIELD,
        }
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

fn ratio_pct(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    Some(numerator? / positive(denominator)? * 100.0)
}

/// Derive `metric` for a snapshot.
///
/// Returns `None` when an input is missing, out of its valid domain (e.g. a
/// non-positive P/E), or when the result is not finite. Non-finite results
/// are logged as data-quality events.
#[must_use]
pub fn derive(metric: Metric, s: &MetricSnapshot, config: &DerivationConfig) -> Option<f64> {
    let value = match metric {
        Metric::PriceToEarnings => positive(s.pe_ratio)?,
        Metric::PriceToBook => positive(s.pb_ratio)?,
        Metric::PriceToSales => positive(s.ps_ratio)?,
        Metric::PriceEarningsToGrowth => {
            let pe = positive(s.pe_ratio)?;
            let growth = positive(year_over_year_growth(&s.eps_quarters))?;
            pe / growth
        }
        Metric::RevenueGrowth => year_over_year_growth(&s.revenue_quarters)?,
        Metric::EpsGrowth => year_over_year_growth(&s.eps_quarters)?,
        Metric::NetMargin => s.net_margin?,
        Metric::OperatingMargin => s.operating_margin?,
        Metric::ReturnOnEquity => s.roe?,
        Metric::ReturnOnAssets => s.roa?,
        Metric::DebtToEquity => s.debt_to_equity.filter(|v| *v >= 0.0)?,
        Metric::InterestCoverage => s.interest_coverage?,
        Metric::CurrentRatio => {
            credited_liquidity(s.current_ratio.filter(|v| *v >= 0.0)?, config.current_ratio_optimal)
        }
        Metric::QuickRatio => {
            credited_liquidity(s.quick_ratio.filter(|v| *v >= 0.0)?, config.quick_ratio_optimal)
        }
        Metric::Return1m => s.return_1m?,
        Metric::Return3m => s.return_3m?,
        Metric::Return6m => s.return_6m?,
        Metric::Return12m => s.return_12m?,
        Metric::Rsi => s.rsi?,
        Metric::MacdHistogram => s.macd_histogram?,
        Metric::PriceVsSma50 => (positive(s.price)? / positive(s.sma_50)? - 1.0) * 100.0,
        Metric::AnalystRating => {
            let buy = f64::from(s.analyst_buy.unwrap_or(0));
            let hold = f64::from(s.analyst_hold.unwrap_or(0));
            let sell = f64::from(s.analyst_sell.unwrap_or(0));
            let total = buy + hold + sell;
            if total <= 0.0 {
                return None;
            }
            (buy * 100.0 + hold * 50.0) / total
        }
        Metric::TargetUpside => (positive(s.price_target)? / positive(s.price)? - 1.0) * 100.0,
        Metric::InsiderNetSharesPct => ratio_pct(s.insider_net_shares, s.shares_outstanding)?,
        Metric::InsiderNetValuePct => ratio_pct(s.insider_net_value, s.market_cap)?,
        Metric::InstitutionalOwnershipPct => {
            ratio_pct(s.institutional_shares, s.shares_outstanding)?
        }
        Metric::InstitutionalChangePct => {
            let now = s.institutional_shares?;
            let prior = positive(s.institutional_shares_prior)?;
            (now - prior) / prior * 100.0
        }
        Metric::InstitutionalHolders => f64::from(s.institutional_holders.filter(|n| *n > 0)?),
        Metric::NewsSentiment => {
            s.news_articles.filter(|n| *n > 0)?;
            s.news_sentiment?
        }
        Metric::NewsNetPositive => {
            let articles = f64::from(s.news_articles.filter(|n| *n > 0)?);
            let pos = f64::from(s.news_positive.unwrap_or(0));
            let neg = f64::from(s.news_negative.unwrap_or(0));
            (pos - neg) / articles * 100.0
        }
        Metric::DividendYield
        | Metric::PayoutDeviation
        | Metric::DividendGrowth
        | Metric::DividendStreak => {
            if !s.pays_dividend(config.min_dividend_yield) {
                return None;
            }
            match metric {
                Metric::DividendYield => s.dividend_yield?,
                Metric::PayoutDeviation => (s.payout_ratio? - config.payout_target).abs(),
                Metric::DividendGrowth => s.dividend_growth?,
                _ => f64::from(s.dividend_streak?),
            }
        }
    };

    if value.is_finite() {
        Some(value)
    } else {
        tracing::debug!(
            symbol = s.symbol(),
            metric = metric.as_str(),
            "non-finite metric value excluded"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::Date;

    fn snapshot() -> MetricSnapshot {
        MetricSnapshot::new("TEST", "Industrials", Date::from_ymd_opt(2024, 3, 29).unwrap())
    }

    #[test]
    fn test_negative_pe_excluded() {
        let mut s = snapshot();
        s.pe_ratio = Some(-8.0);
        assert!(derive(Metric::PriceToEarnings, &s, &DerivationConfig::default()).is_none());
        s.pe_ratio = Some(18.0);
        assert_eq!(derive(Metric::PriceToEarnings, &s, &DerivationConfig::default()), Some(18.0));
    }

    #[test]
    fn test_peg_requires_positive_growth() {
        let mut s = snapshot();
        s.pe_ratio = Some(30.0);
        s.eps_quarters = vec![1.2, 1.1, 1.0, 0.9, 1.0];
        // 20% EPS growth
        assert_relative_eq!(
            derive(Metric::PriceEarningsToGrowth, &s, &DerivationConfig::default()).unwrap(),
            1.5,
            epsilon = 1e-12
        );
        s.eps_quarters = vec![0.8, 1.1, 1.0, 0.9, 1.0];
        assert!(derive(Metric::PriceEarningsToGrowth, &s, &DerivationConfig::default()).is_none());
    }

    #[test]
    fn test_insider_is_size_invariant() {
        let config = DerivationConfig::default();
        let mut small = snapshot();
        small.insider_net_shares = Some(10_000.0);
        small.shares_outstanding = Some(1_000_000.0);

        let mut large = snapshot();
        large.insider_net_shares = Some(10_000_000.0);
        large.shares_outstanding = Some(1_000_000_000.0);

        let a = derive(Metric::InsiderNetSharesPct, &small, &config).unwrap();
        let b = derive(Metric::InsiderNetSharesPct, &large, &config).unwrap();
        assert_relative_eq!(a, 1.0, epsilon = 1e-12);
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }

    #[test]
    fn test_analyst_rating() {
        let mut s = snapshot();
        s.analyst_buy = Some(6);
        s.analyst_hold = Some(3);
        s.analyst_sell = Some(1);
        assert_relative_eq!(
            derive(Metric::AnalystRating, &s, &DerivationConfig::default()).unwrap(),
            75.0
        );
        s.analyst_buy = Some(0);
        s.analyst_hold = Some(0);
        s.analyst_sell = Some(0);
        assert!(derive(Metric::AnalystRating, &s, &DerivationConfig::default()).is_none());
    }

    #[test]
    fn test_dividend_metrics_only_for_payers() {
        let config = DerivationConfig::default();
        let mut s = snapshot();
        s.dividend_yield = Some(0.1);
        s.payout_ratio = Some(40.0);
        assert!(derive(Metric::DividendYield, &s, &config).is_none());
        assert!(derive(Metric::PayoutDeviation, &s, &config).is_none());

        s.dividend_yield = Some(3.0);
        assert_eq!(derive(Metric::DividendYield, &s, &config), Some(3.0));
        assert_eq!(derive(Metric::PayoutDeviation, &s, &config), Some(5.0));
    }

    #[test]
    fn test_non_finite_excluded() {
        let mut s = snapshot();
        s.roe = Some(f64::NAN);
        s.return_1m = Some(f64::INFINITY);
        let config = DerivationConfig::default();
        assert!(derive(Metric::ReturnOnEquity, &s, &config).is_none());
        assert!(derive(Metric::Return1m, &s, &config).is_none());
    }

    #[test]
    fn test_news_requires_articles() {
        let mut s = snapshot();
        s.news_sentiment = Some(70.0);
        s.news_articles = Some(0);
        assert!(derive(Metric::NewsSentiment, &s, &DerivationConfig::default()).is_none());
        s.news_articles = Some(10);
        s.news_positive = Some(6);
        s.news_negative = Some(2);
        assert_eq!(derive(Metric::NewsSentiment, &s, &DerivationConfig::default()), Some(70.0));
        assert_relative_eq!(
            derive(Metric::NewsNetPositive, &s, &DerivationConfig::default()).unwrap(),
            40.0
        );
    }
}
