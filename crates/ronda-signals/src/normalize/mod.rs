//! Sector-relative percentile normalization.
//!
//! Every sub-metric is converted into a 0-100 percentile against the
//! security's sector for the run date. When a sector has too few finite
//! observations for a metric, that (sector, metric) pair falls back to an
//! absolute benchmark curve and the fallback is tagged on every score it
//! produces.
//!
//! Statistics are built once per run ([`SectorStatistics::build`]) and
//! published through a [`DistributionTable`] for concurrent readers.

mod distribution;
mod statistics;
mod strategy;
mod table;

use std::collections::BTreeMap;

use ronda_traits::{BenchmarkCurve, Metric, Result, RondaError};
use serde::{Deserialize, Serialize};

use crate::derive::DerivationConfig;

pub use distribution::SectorDistribution;
pub use statistics::SectorStatistics;
pub use strategy::{AbsoluteBenchmark, RankingStrategy, SectorRelative, direction_adjusted};
pub use table::DistributionTable;

/// Configuration for sector normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Minimum finite observations for sector-relative ranking (default: 5)
    pub min_sector_sample: usize,

    /// Lower winsorization quantile (default: 0.01)
    pub winsor_lower: f64,

    /// Upper winsorization quantile (default: 0.99)
    pub winsor_upper: f64,

    /// Benchmark curve overrides for the small-sample fallback
    pub benchmarks: BTreeMap<Metric, BenchmarkCurve>,

    /// Metric derivation parameters
    pub derivation: DerivationConfig,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_sector_sample: 5,
            winsor_lower: 0.01,
            winsor_upper: 0.99,
            benchmarks: BTreeMap::new(),
            derivation: DerivationConfig::default(),
        }
    }
}

impl NormalizerConfig {
    /// Benchmark curve for `metric`, honoring overrides.
    #[must_use]
    pub fn benchmark(&self, metric: Metric) -> BenchmarkCurve {
        self.benchmarks
            .get(&metric)
            .copied()
            .unwrap_or_else(|| metric.default_benchmark())
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.min_sector_sample == 0 {
            return Err(RondaError::InvalidConfig(
                "min_sector_sample must be at least 1".into(),
            ));
        }
        if !(0.0..0.5).contains(&self.winsor_lower) || !(0.5..=1.0).contains(&self.winsor_upper) {
            return Err(RondaError::InvalidConfig(format!(
                "winsorization bounds out of range: [{}, {}]",
                self.winsor_lower, self.winsor_upper
            )));
        }
        if let Some((metric, curve)) = self
            .benchmarks
            .iter()
            .find(|(_, c)| !c.center.is_finite() || !c.slope.is_finite() || c.slope <= 0.0)
        {
            return Err(RondaError::InvalidConfig(format!(
                "benchmark for {metric} needs finite center and positive slope, got {curve:?}"
            )));
        }
        let d = &self.derivation;
        if d.current_ratio_optimal <= 0.0 || d.quick_ratio_optimal <= 0.0 {
            return Err(RondaError::InvalidConfig(
                "liquidity optimal ratios must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NormalizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_sector_sample, 5);
    }

    #[test]
    fn test_benchmark_override() {
        let mut config = NormalizerConfig::default();
        assert_eq!(
            config.benchmark(Metric::PriceToEarnings),
            Metric::PriceToEarnings.default_benchmark()
        );
        config
            .benchmarks
            .insert(Metric::PriceToEarnings, BenchmarkCurve::new(30.0, 1.0));
        assert_eq!(config.benchmark(Metric::PriceToEarnings).center, 30.0);
    }

    #[test]
    fn test_invalid_config() {
        let config = NormalizerConfig {
            min_sector_sample: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NormalizerConfig {
            winsor_lower: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = NormalizerConfig::default();
        config
            .benchmarks
            .insert(Metric::Rsi, BenchmarkCurve::new(50.0, -1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: NormalizerConfig =
            serde_json::from_str(r#"{"min_sector_sample": 8}"#).unwrap();
        assert_eq!(config.min_sector_sample, 8);
        assert_eq!(config.winsor_upper, 0.99);
    }
}
