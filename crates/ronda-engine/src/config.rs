//! Versioned engine configuration.
//!
//! Every constant the engine uses lives here, loaded from a JSON file and
//! overridden from the environment.

use std::env;
use std::path::Path;

use ronda_combine::{CompletenessConfig, LifecycleThresholds, WeightConfig};
use ronda_signals::{CalculatorConfig, NormalizerConfig};
use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

use crate::explain::ExplainerConfig;
use crate::peers::PeerConfig;
use crate::stabilizer::StabilizerConfig;

/// Path of the JSON configuration file.
pub const CONFIG_PATH_VAR: &str = "RONDA_CONFIG";
/// Smoothing factor override.
pub const SMOOTHING_ALPHA_VAR: &str = "RONDA_SMOOTHING_ALPHA";
/// Worker count override.
pub const WORKERS_VAR: &str = "RONDA_WORKERS";
/// Minimum sector sample override.
pub const MIN_SECTOR_SAMPLE_VAR: &str = "RONDA_MIN_SECTOR_SAMPLE";
/// Score database URL override.
pub const DATABASE_URL_VAR: &str = "RONDA_DATABASE_URL";

/// Batch run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Concurrent securities in flight (default: 8)
    pub workers: usize,

    /// Attempts per security for transient store failures (default: 2)
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds (default: 50)
    pub retry_backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            max_attempts: 2,
            retry_backoff_ms: 50,
        }
    }
}

impl OrchestratorConfig {
    /// Check worker and attempt counts.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RondaError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(RondaError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Complete engine configuration.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::EngineConfig;
///
/// // Defaults, then RONDA_CONFIG file, then RONDA_* overrides
/// let config = EngineConfig::from_env()?;
/// config.validate()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Version tag stored with every score
    pub version: String,

    /// Sector normalization
    pub normalizer: NormalizerConfig,

    /// Factor calculator weights
    pub calculators: CalculatorConfig,

    /// Lifecycle classification thresholds
    pub lifecycle: LifecycleThresholds,

    /// Lifecycle weight profiles
    pub weights: WeightConfig,

    /// Completeness bands and minimum data
    pub completeness: CompletenessConfig,

    /// Score smoothing
    pub stabilizer: StabilizerConfig,

    /// Peer similarity
    pub peers: PeerConfig,

    /// Batch execution
    pub orchestrator: OrchestratorConfig,

    /// Score change explanations
    pub explainer: ExplainerConfig,

    /// SQLite URL of the score store
    pub database_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            normalizer: NormalizerConfig::default(),
            calculators: CalculatorConfig::default(),
            lifecycle: LifecycleThresholds::default(),
            weights: WeightConfig::default(),
            completeness: CompletenessConfig::default(),
            stabilizer: StabilizerConfig::default(),
            peers: PeerConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            explainer: ExplainerConfig::default(),
            database_url: "sqlite://ronda.db".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration file. Missing sections take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load `.env`, read the file named by `RONDA_CONFIG` if set, then apply
    /// `RONDA_*` overrides.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                tracing::info!(path = %path, "loading engine configuration");
                Self::load(path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(alpha) = lookup(SMOOTHING_ALPHA_VAR) {
            self.stabilizer.alpha = parse_var(SMOOTHING_ALPHA_VAR, &alpha)?;
        }
        if let Some(workers) = lookup(WORKERS_VAR) {
            self.orchestrator.workers = parse_var(WORKERS_VAR, &workers)?;
        }
        if let Some(min) = lookup(MIN_SECTOR_SAMPLE_VAR) {
            self.normalizer.min_sector_sample = parse_var(MIN_SECTOR_SAMPLE_VAR, &min)?;
        }
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            self.database_url = url;
        }
        Ok(())
    }

    /// Validate every section. Run once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(RondaError::InvalidConfig("version must not be empty".into()));
        }
        self.normalizer.validate()?;
        self.lifecycle.validate()?;
        self.weights.validate()?;
        self.completeness.validate()?;
        self.stabilizer.validate()?;
        self.peers.validate()?;
        self.orchestrator.validate()?;
        self.explainer.validate()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RondaError::InvalidConfig(format!("{key}: cannot parse {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrator.workers, 8);
        assert_relative_eq!(config.stabilizer.alpha, 0.3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "version": "v2", "stabilizer": { "alpha": 0.5 }, "peers": { "count": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.version, "v2");
        assert_relative_eq!(config.stabilizer.alpha, 0.5);
        assert_eq!(config.peers.count, 3);
        assert_eq!(config.normalizer.min_sector_sample, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (SMOOTHING_ALPHA_VAR, "0.6"),
            (WORKERS_VAR, "2"),
            (MIN_SECTOR_SAMPLE_VAR, "10"),
            (DATABASE_URL_VAR, "sqlite::memory:"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_relative_eq!(config.stabilizer.alpha, 0.6);
        assert_eq!(config.orchestrator.workers, 2);
        assert_eq!(config.normalizer.min_sector_sample, 10);
        assert_eq!(config.database_url, "sqlite::memory:");
    }

    #[test]
    fn test_bad_override() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(|k| (k == WORKERS_VAR).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, RondaError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let mut config = EngineConfig::default();
        config.stabilizer.alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.orchestrator.workers = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.explainer.max_reasons = 0;
        assert!(config.validate().is_err());
    }
}
