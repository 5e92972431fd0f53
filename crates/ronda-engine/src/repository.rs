//! Metric snapshot sources.
//!
//! [`SnapshotRepository`] holds snapshot history in memory and serves the
//! point-in-time view for a run date: for each active security, its latest
//! snapshot dated on or before the run date. History can be loaded from a
//! JSON array of snapshots or from a CSV file through a polars `DataFrame`.
//!
//! CSV layout: one row per security and date with columns `symbol`,
//! `sector`, `as_of` (YYYY-MM-DD) and optional `industry`, `active` and any
//! snapshot metric named as in JSON (`pe_ratio`, `roe`, ...). Quarterly
//! series are spread over `revenue_q0..revenue_q7` and `eps_q0..eps_q7`,
//! with `q0` the most recent quarter.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use polars::prelude::*;
use ronda_traits::{Date, MetricRepository, MetricSnapshot, Result, RondaError};

const KEY_COLUMNS: [&str; 3] = ["symbol", "sector", "as_of"];

/// Quarters read from the CSV quarterly columns.
pub const CSV_QUARTERS: usize = 8;

const FLOAT_COLUMNS: [&str; 30] = [
    "price",
    "market_cap",
    "shares_outstanding",
    "pe_ratio",
    "pb_ratio",
    "ps_ratio",
    "net_margin",
    "operating_margin",
    "roe",
    "roa",
    "debt_to_equity",
    "interest_coverage",
    "current_ratio",
    "quick_ratio",
    "return_1m",
    "return_3m",
    "return_6m",
    "return_12m",
    "rsi",
    "macd_histogram",
    "sma_50",
    "price_target",
    "insider_net_shares",
    "insider_net_value",
    "institutional_shares",
    "institutional_shares_prior",
    "news_sentiment",
    "dividend_yield",
    "payout_ratio",
    "dividend_growth",
];

const COUNT_COLUMNS: [&str; 8] = [
    "analyst_buy",
    "analyst_hold",
    "analyst_sell",
    "institutional_holders",
    "news_articles",
    "news_positive",
    "news_negative",
    "dividend_streak",
];

fn float_field<'a>(s: &'a mut MetricSnapshot, column: &str) -> Option<&'a mut Option<f64>> {
    Some(match column {
        "price" => &mut s.price,
        "market_cap" => &mut s.market_cap,
        "shares_outstanding" => &mut s.shares_outstanding,
        "pe_ratio" => &mut s.pe_ratio,
        "pb_ratio" => &mut s.pb_ratio,
        "ps_ratio" => &mut s.ps_ratio,
        "net_margin" => &mut s.net_margin,
        "operating_margin" => &mut s.operating_margin,
        "roe" => &mut s.roe,
        "roa" => &mut s.roa,
        "debt_to_equity" => &mut s.debt_to_equity,
        "interest_coverage" => &mut s.interest_coverage,
        "current_ratio" => &mut s.current_ratio,
        "quick_ratio" => &mut s.quick_ratio,
        "return_1m" => &mut s.return_1m,
        "return_3m" => &mut s.return_3m,
        "return_6m" => &mut s.return_6m,
        "return_12m" => &mut s.return_12m,
        "rsi" => &mut s.rsi,
        "macd_histogram" => &mut s.macd_histogram,
        "sma_50" => &mut s.sma_50,
        "price_target" => &mut s.price_target,
        "insider_net_shares" => &mut s.insider_net_shares,
        "insider_net_value" => &mut s.insider_net_value,
        "institutional_shares" => &mut s.institutional_shares,
        "institutional_shares_prior" => &mut s.institutional_shares_prior,
        "news_sentiment" => &mut s.news_sentiment,
        "dividend_yield" => &mut s.dividend_yield,
        "payout_ratio" => &mut s.payout_ratio,
        "dividend_growth" => &mut s.dividend_growth,
        _ => return None,
    })
}

fn count_field<'a>(s: &'a mut MetricSnapshot, column: &str) -> Option<&'a mut Option<u32>> {
    Some(match column {
        "analyst_buy" => &mut s.analyst_buy,
        "analyst_hold" => &mut s.analyst_hold,
        "analyst_sell" => &mut s.analyst_sell,
        "institutional_holders" => &mut s.institutional_holders,
        "news_articles" => &mut s.news_articles,
        "news_positive" => &mut s.news_positive,
        "news_negative" => &mut s.news_negative,
        "dividend_streak" => &mut s.dividend_streak,
        _ => return None,
    })
}

/// In-memory snapshot history with point-in-time selection.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::SnapshotRepository;
/// use ronda_traits::MetricRepository;
///
/// let repo = SnapshotRepository::from_csv("snapshots.csv")?;
/// let snapshots = repo.fetch_snapshots(as_of).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotRepository {
    snapshots: Vec<MetricSnapshot>,
}

impl SnapshotRepository {
    /// Wrap a snapshot history.
    #[must_use]
    pub const fn new(snapshots: Vec<MetricSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Every stored snapshot.
    #[must_use]
    pub fn snapshots(&self) -> &[MetricSnapshot] {
        &self.snapshots
    }

    /// Load a JSON array of snapshots.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let snapshots: Vec<MetricSnapshot> = serde_json::from_str(&text)?;
        tracing::debug!(count = snapshots.len(), "loaded JSON snapshots");
        Ok(Self::new(snapshots))
    }

    /// Load a CSV snapshot file.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;
        Self::from_frame(&df)
    }

    /// Load snapshots from a `DataFrame` in the CSV layout.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        for required in KEY_COLUMNS {
            if df.column(required).is_err() {
                return Err(RondaError::InvalidData(format!(
                    "snapshot frame is missing column {required}"
                )));
            }
        }

        let df = &drop_incomplete_rows(df)?;
        let symbols = string_column(df, "symbol")?;
        let sectors = string_column(df, "sector")?;
        let dates = string_column(df, "as_of")?;
        let industries = match df.column("industry") {
            Ok(_) => Some(string_column(df, "industry")?),
            Err(_) => None,
        };
        let active = match df.column("active") {
            Ok(col) => Some(col.as_materialized_series().cast(&DataType::Boolean)?),
            Err(_) => None,
        };

        let mut snapshots = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let (Some(symbol), Some(sector), Some(date)) = (
                symbols.str()?.get(row),
                sectors.str()?.get(row),
                dates.str()?.get(row),
            ) else {
                return Err(RondaError::InvalidData(format!("row {row}: missing key column")));
            };
            let as_of = Date::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
                RondaError::InvalidData(format!("row {row}: bad as_of {date:?}: {e}"))
            })?;

            let mut snapshot = MetricSnapshot::new(symbol.trim(), sector.trim(), as_of);
            if let Some(industries) = &industries {
                if let Some(industry) = industries.str()?.get(row) {
                    snapshot.security.industry = industry.to_string();
                }
            }
            if let Some(active) = &active {
                if let Some(flag) = active.bool()?.get(row) {
                    snapshot.security.active = flag;
                }
            }
            snapshots.push(snapshot);
        }

        for name in FLOAT_COLUMNS.iter().chain(COUNT_COLUMNS.iter()) {
            let Some(values) = float_column(df, name)? else {
                continue;
            };
            for (snapshot, value) in snapshots.iter_mut().zip(values.f64()?.into_iter()) {
                let Some(value) = value else {
                    continue;
                };
                if !value.is_finite() {
                    tracing::debug!(
                        symbol = snapshot.symbol(),
                        column = name,
                        "non-finite value excluded"
                    );
                    continue;
                }
                if let Some(field) = float_field(snapshot, name) {
                    *field = Some(value);
                } else if let Some(field) = count_field(snapshot, name) {
                    *field = (value >= 0.0).then_some(value.round() as u32);
                }
            }
        }

        for (prefix, quarterly) in [("revenue_q", true), ("eps_q", false)] {
            for q in 0..CSV_QUARTERS {
                let Some(values) = float_column(df, &format!("{prefix}{q}"))? else {
                    break;
                };
                for (snapshot, value) in snapshots.iter_mut().zip(values.f64()?.into_iter()) {
                    if value.is_some_and(|v| !v.is_finite()) {
                        tracing::debug!(
                            symbol = snapshot.symbol(),
                            column = %format_args!("{prefix}{q}"),
                            "non-finite value excluded"
                        );
                    }
                    let series = if quarterly {
                        &mut snapshot.revenue_quarters
                    } else {
                        &mut snapshot.eps_quarters
                    };
                    // Quarters stay contiguous from the most recent one
                    if series.len() == q {
                        if let Some(v) = value.filter(|v| v.is_finite()) {
                            series.push(v);
                        }
                    }
                }
            }
        }

        tracing::debug!(rows = snapshots.len(), "loaded snapshot frame");
        Ok(Self::new(snapshots))
    }

    /// Point-in-time view: each active security's latest snapshot on or
    /// before `as_of`, in symbol order.
    #[must_use]
    pub fn as_of(&self, as_of: Date) -> Vec<MetricSnapshot> {
        let mut latest: HashMap<&str, &MetricSnapshot> = HashMap::new();
        for snapshot in self.snapshots.iter().filter(|s| s.as_of <= as_of) {
            let entry = latest.entry(snapshot.symbol()).or_insert(snapshot);
            if snapshot.as_of > entry.as_of {
                *entry = snapshot;
            }
        }

        let mut view: Vec<MetricSnapshot> = latest
            .into_values()
            .filter(|s| s.security.active)
            .cloned()
            .collect();
        view.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        view
    }
}

#[async_trait]
impl MetricRepository for SnapshotRepository {
    async fn fetch_snapshots(&self, as_of: Date) -> Result<Vec<MetricSnapshot>> {
        Ok(self.as_of(as_of))
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Series> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Option<Series>> {
    match df.column(name) {
        Ok(col) => Ok(Some(col.as_materialized_series().cast(&DataType::Float64)?)),
        Err(_) => Ok(None),
    }
}

/// Rows without a symbol, sector or date cannot be keyed.
fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut mask = BooleanChunked::full("keep".into(), true, df.height());
    for name in KEY_COLUMNS {
        mask = &mask & &df.column(name)?.as_materialized_series().is_not_null();
    }
    let kept = df.filter(&mask)?;
    if kept.height() < df.height() {
        tracing::warn!(
            dropped = df.height() - kept.height(),
            "skipping snapshot rows without symbol, sector or date"
        );
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(symbol: &str, as_of: Date, pe: f64) -> MetricSnapshot {
        let mut s = MetricSnapshot::new(symbol, "Tech", as_of);
        s.pe_ratio = Some(pe);
        s
    }

    #[tokio::test]
    async fn test_point_in_time_selection() {
        let mut gone = snapshot("OLD", date(2024, 3, 1), 9.0);
        gone.security.active = false;
        let repo = SnapshotRepository::new(vec![
            snapshot("AAA", date(2024, 1, 31), 10.0),
            snapshot("AAA", date(2024, 2, 29), 11.0),
            snapshot("AAA", date(2024, 3, 31), 12.0),
            snapshot("BBB", date(2024, 2, 15), 20.0),
            gone,
        ]);

        let view = repo.fetch_snapshots(date(2024, 3, 15)).await.unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].symbol(), "AAA");
        assert_eq!(view[0].pe_ratio, Some(11.0));
        assert_eq!(view[1].symbol(), "BBB");

        assert!(repo.fetch_snapshots(date(2023, 12, 31)).await.unwrap().is_empty());
    }

    #[test]
    fn test_from_frame() {
        let df = df! {
            "symbol" => ["AAA", "BBB"],
            "sector" => ["Tech", "Tech"],
            "as_of" => ["2024-03-29", "2024-03-29"],
            "pe_ratio" => [Some(18.5), None],
            "analyst_buy" => [Some(12i64), Some(3)],
            "revenue_q0" => [Some(110.0), Some(50.0)],
            "revenue_q1" => [Some(105.0), None],
            "revenue_q2" => [Some(100.0), Some(45.0)],
        }
        .unwrap();

        let repo = SnapshotRepository::from_frame(&df).unwrap();
        let snaps = repo.snapshots();
        assert_eq!(snaps.len(), 2);

        assert_eq!(snaps[0].symbol(), "AAA");
        assert_eq!(snaps[0].as_of, date(2024, 3, 29));
        assert_relative_eq!(snaps[0].pe_ratio.unwrap(), 18.5);
        assert_eq!(snaps[0].analyst_buy, Some(12));
        assert_eq!(snaps[0].revenue_quarters, vec![110.0, 105.0, 100.0]);

        assert!(snaps[1].pe_ratio.is_none());
        // A gap ends the quarterly series
        assert_eq!(snaps[1].revenue_quarters, vec![50.0]);
    }

    #[test]
    fn test_from_frame_excludes_non_finite() {
        let df = df! {
            "symbol" => ["AAA", "BBB"],
            "sector" => ["Tech", "Tech"],
            "as_of" => ["2024-03-29", "2024-03-29"],
            "pe_ratio" => [f64::NAN, 12.0],
            "roe" => [f64::INFINITY, f64::NEG_INFINITY],
            "eps_q0" => [1.2, f64::NAN],
            "eps_q1" => [1.1, 0.9],
        }
        .unwrap();

        let snaps = SnapshotRepository::from_frame(&df).unwrap().snapshots().to_vec();
        assert!(snaps[0].pe_ratio.is_none());
        assert!(snaps[0].roe.is_none());
        assert!(snaps[1].roe.is_none());
        assert_eq!(snaps[1].pe_ratio, Some(12.0));
        assert_eq!(snaps[0].eps_quarters, vec![1.2, 1.1]);
        assert!(snaps[1].eps_quarters.is_empty());
    }

    #[test]
    fn test_from_frame_requires_key_columns() {
        let df = df! {
            "symbol" => ["AAA"],
            "pe_ratio" => [10.0],
        }
        .unwrap();
        assert!(matches!(
            SnapshotRepository::from_frame(&df),
            Err(RondaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_from_frame_bad_date() {
        let df = df! {
            "symbol" => ["AAA"],
            "sector" => ["Tech"],
            "as_of" => ["03/29/2024"],
        }
        .unwrap();
        assert!(SnapshotRepository::from_frame(&df).is_err());
    }

    #[test]
    fn test_from_csv_file() {
        let path = std::env::temp_dir().join(format!("ronda-snapshots-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "symbol,sector,as_of,market_cap,eps_q0,eps_q1\n\
             AAA,Tech,2024-03-29,1000000000,2.0,1.5\n\
             BBB,Energy,2024-03-29,,0.5,\n",
        )
        .unwrap();

        let repo = SnapshotRepository::from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let snaps = repo.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].market_cap, Some(1e9));
        assert_eq!(snaps[0].eps_quarters, vec![2.0, 1.5]);
        assert_eq!(snaps[1].sector(), "Energy");
        assert!(snaps[1].market_cap.is_none());
        assert_eq!(snaps[1].eps_quarters, vec![0.5]);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("ronda-snapshots-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"symbol": "AAA", "sector": "Tech", "as_of": "2024-03-29", "roe": 21.0}]"#,
        )
        .unwrap();

        let repo = SnapshotRepository::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(repo.snapshots()[0].roe, Some(21.0));
    }
}
