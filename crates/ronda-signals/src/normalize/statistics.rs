//! Per-run sector statistics.

use std::collections::HashMap;

use ronda_traits::{Date, Metric, MetricScore, MetricSnapshot, PercentileRanker};

use super::{
    AbsoluteBenchmark, NormalizerConfig, RankingStrategy, SectorDistribution, SectorRelative,
    direction_adjusted,
};
use crate::derive::derive;

type SectorStrategies = HashMap<Metric, Box<dyn RankingStrategy>>;

/// Ranking strategies for every (sector, metric) pair on one run date.
///
/// Built exactly once per run from the batched snapshot fetch and then shared
/// read-only by every worker. The choice between sector-relative ranking and
/// the absolute-benchmark fallback is made here, never per call.
///
/// # Example
///
/// ```no_run
/// use ronda_signals::normalize::{NormalizerConfig, SectorStatistics};
/// use ronda_traits::{Date, Metric, MetricSnapshot, PercentileRanker};
///
/// let as_of = Date::from_ymd_opt(2024, 3, 29).unwrap();
/// let snapshots: Vec<MetricSnapshot> = vec![/* one batched fetch */];
/// let stats = SectorStatistics::build(as_of, &snapshots, NormalizerConfig::default());
///
/// if let Some(s) = snapshots.first() {
///     let pe = stats.rank(s, Metric::PriceToEarnings);
/// }
/// ```
#[derive(Debug)]
pub struct SectorStatistics {
    as_of: Date,
    config: NormalizerConfig,
    sectors: HashMap<String, SectorStrategies>,
}

impl SectorStatistics {
    /// Build statistics for every sector present in `snapshots`.
    #[must_use]
    pub fn build(as_of: Date, snapshots: &[MetricSnapshot], config: NormalizerConfig) -> Self {
        let mut by_sector: HashMap<&str, Vec<&MetricSnapshot>> = HashMap::new();
        for snapshot in snapshots {
            by_sector
                .entry(snapshot.sector())
                .or_default()
                .push(snapshot);
        }

        let mut sectors = HashMap::with_capacity(by_sector.len());
        let mut fallbacks = 0usize;

        for (sector, members) in by_sector {
            let mut strategies: SectorStrategies = HashMap::with_capacity(Metric::ALL.len());

            for metric in Metric::ALL {
                let values: Vec<f64> = members
                    .iter()
                    .filter_map(|s| derive(metric, s, &config.derivation))
                    .collect();

                let strategy = Self::select(metric, &values, &config);
                if strategy.distribution().is_none() {
                    fallbacks += 1;
                    tracing::debug!(
                        sector,
                        metric = metric.as_str(),
                        sample = values.len(),
                        "sector sample below threshold, using absolute benchmark"
                    );
                }
                strategies.insert(metric, strategy);
            }

            sectors.insert(sector.to_string(), strategies);
        }

        tracing::info!(
            %as_of,
            sectors = sectors.len(),
            securities = snapshots.len(),
            fallbacks,
            "sector statistics built"
        );

        Self {
            as_of,
            config,
            sectors,
        }
    }

    fn select(
        metric: Metric,
        values: &[f64],
        config: &NormalizerConfig,
    ) -> Box<dyn RankingStrategy> {
        if values.len() >= config.min_sector_sample {
            if let Some(dist) =
                SectorDistribution::from_values(values, config.winsor_lower, config.winsor_upper)
            {
                return Box::new(SectorRelative::new(dist));
            }
        }
        Box::new(AbsoluteBenchmark::new(config.benchmark(metric), values.len()))
    }

    /// Run date the statistics were built for.
    #[must_use]
    pub const fn as_of(&self) -> Date {
        self.as_of
    }

    /// Normalization settings the statistics were built with.
    #[must_use]
    pub const fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Sectors covered by the statistics.
    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.sectors.keys().map(String::as_str)
    }

    /// Strategy for a (sector, metric) pair, if the sector was seen.
    #[must_use]
    pub fn strategy(&self, sector: &str, metric: Metric) -> Option<&dyn RankingStrategy> {
        self.sectors
            .get(sector)
            .and_then(|s| s.get(&metric))
            .map(|s| &**s)
    }

    /// Sector distribution for a (sector, metric) pair, if one was built.
    #[must_use]
    pub fn distribution(&self, sector: &str, metric: Metric) -> Option<&SectorDistribution> {
        self.strategy(sector, metric)?.distribution()
    }
}

impl PercentileRanker for SectorStatistics {
    fn rank(&self, snapshot: &MetricSnapshot, metric: Metric) -> Option<MetricScore> {
        let raw = derive(metric, snapshot, &self.config.derivation)?;

        let (score, method, sample_count) = match self.strategy(snapshot.sector(), metric) {
            Some(strategy) => (
                strategy.score(raw)?,
                strategy.method(),
                strategy.sample_count(),
            ),
            None => {
                let fallback = AbsoluteBenchmark::new(self.config.benchmark(metric), 0);
                (fallback.score(raw)?, fallback.method(), 0)
            }
        };

        Some(MetricScore {
            metric,
            raw,
            percentile: direction_adjusted(metric, score),
            method,
            sample_count,
        })
    }
}
