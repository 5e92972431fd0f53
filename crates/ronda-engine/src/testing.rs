//! Shared test fixtures.

use ronda_traits::{Date, MetricSnapshot};

pub(crate) fn as_of() -> Date {
    Date::from_ymd_opt(2024, 3, 29).unwrap()
}

/// A non-dividend snapshot with every other input present, scaled by `scale`.
pub(crate) fn full_snapshot(symbol: &str, sector: &str, scale: f64) -> MetricSnapshot {
    let mut s = MetricSnapshot::new(symbol, sector, as_of());
    s.price = Some(100.0 * scale);
    s.market_cap = Some(50e9 * scale);
    s.shares_outstanding = Some(5e8);
    s.pe_ratio = Some(18.0 * scale);
    s.pb_ratio = Some(3.0 * scale);
    s.ps_ratio = Some(4.0 * scale);
    s.net_margin = Some(15.0 * scale);
    s.operating_margin = Some(20.0 * scale);
    s.roe = Some(18.0 * scale);
    s.roa = Some(8.0 * scale);
    s.debt_to_equity = Some(0.6 * scale);
    s.interest_coverage = Some(9.0 * scale);
    s.current_ratio = Some(1.8 * scale);
    s.quick_ratio = Some(1.2 * scale);
    s.revenue_quarters = vec![112.0 * scale, 108.0, 104.0, 101.0, 100.0];
    s.eps_quarters = vec![1.2 * scale, 1.1, 1.05, 1.0, 1.0];
    s.return_1m = Some(2.0 * scale);
    s.return_3m = Some(5.0 * scale);
    s.return_6m = Some(9.0 * scale);
    s.return_12m = Some(15.0 * scale);
    s.rsi = Some(55.0);
    s.macd_histogram = Some(0.4 * scale);
    s.sma_50 = Some(95.0);
    s.analyst_buy = Some(12);
    s.analyst_hold = Some(5);
    s.analyst_sell = Some(1);
    s.price_target = Some(115.0 * scale);
    s.insider_net_shares = Some(1e5 * scale);
    s.insider_net_value = Some(1e7 * scale);
    s.institutional_holders = Some(900);
    s.institutional_shares = Some(3.5e8);
    s.institutional_shares_prior = Some(3.4e8);
    s.news_sentiment = Some(60.0);
    s.news_articles = Some(20);
    s.news_positive = Some(12);
    s.news_negative = Some(4);
    s
}
