//! Data loading utilities for the Ronda CLI.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use ronda_engine::{EngineConfig, SnapshotRepository, SqliteScoreStore};
use ronda_traits::RondaError;

/// Load snapshots from a `.csv` or `.json` file.
pub(crate) fn load_snapshots(path: &Path) -> Result<SnapshotRepository, RondaError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => SnapshotRepository::from_csv(path),
        Some("json") => SnapshotRepository::from_json_file(path),
        _ => Err(RondaError::InvalidData(format!(
            "unsupported snapshot file {}: expected .csv or .json",
            path.display()
        ))),
    }
}

/// Resolve the engine configuration: an explicit file wins over
/// `RONDA_CONFIG`, environment overrides apply to both.
pub(crate) fn load_config(
    path: Option<&Path>,
    database: Option<&str>,
) -> Result<EngineConfig, RondaError> {
    let mut config = match path {
        Some(path) => {
            let mut config = EngineConfig::load(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => EngineConfig::from_env()?,
    };
    if let Some(url) = database {
        config.database_url = url.to_string();
    }
    config.validate()?;
    Ok(config)
}

/// Open the score database named by the configuration.
pub(crate) async fn open_store(config: &EngineConfig) -> Result<SqliteScoreStore, RondaError> {
    tracing::debug!(url = %config.database_url, "opening score store");
    SqliteScoreStore::connect(&config.database_url).await
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate, RondaError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| RondaError::InvalidData(format!("Invalid date format: {}", e)))
}

/// Parse an optional date, defaulting to today.
pub(crate) fn date_or_today(date: Option<&str>) -> Result<NaiveDate, RondaError> {
    date.map_or_else(|| Ok(Utc::now().date_naive()), parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        let result = parse_date("invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_date_or_today() {
        let date = date_or_today(Some("2024-03-29")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert!(date_or_today(None).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_snapshots(Path::new("snapshots.parquet")).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_explicit_database_overrides_config() {
        let config = load_config(None, Some("sqlite::memory:")).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
    }
}
