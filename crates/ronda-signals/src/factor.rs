//! Shared averaging of ranked sub-metrics into a factor score.

use ronda_traits::stats::weighted_mean;
use ronda_traits::{
    Factor, FactorScore, Metric, MetricScore, MetricSnapshot, PercentileRanker, ScoringMethod,
};

/// Ranked and missing sub-metrics of one group.
#[derive(Debug, Default)]
pub(crate) struct Ranked {
    pub(crate) components: Vec<MetricScore>,
    pub(crate) missing: Vec<Metric>,
    weighted: Vec<(f64, f64)>,
}

impl Ranked {
    /// Rank every `(metric, weight)` pair, remembering the ones that are missing.
    pub(crate) fn collect(
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
        weights: &[(Metric, f64)],
    ) -> Self {
        let mut ranked = Self::default();
        for &(metric, weight) in weights {
            match ranker.rank(snapshot, metric) {
                Some(score) => {
                    ranked.weighted.push((score.percentile, weight));
                    ranked.components.push(score);
                }
                None => ranked.missing.push(metric),
            }
        }
        ranked
    }

    /// Weighted average of the present percentiles.
    pub(crate) fn average(&self) -> Option<f64> {
        weighted_mean(&self.weighted)
    }

    /// Fold another group in, keeping component order.
    pub(crate) fn extend(&mut self, other: Self) {
        self.components.extend(other.components);
        self.missing.extend(other.missing);
        self.weighted.extend(other.weighted);
    }

    /// Finish into a factor score with the given value.
    pub(crate) fn into_score(self, factor: Factor, value: f64) -> Option<FactorScore> {
        let method = ScoringMethod::combine(self.components.iter().map(|c| c.method))?;
        Some(FactorScore {
            factor,
            value: value.clamp(0.0, 100.0),
            method,
            components: self.components,
            missing: self.missing,
        })
    }
}

/// Weighted average of ranked sub-metrics.
///
/// Missing sub-metrics drop out of the average and are listed in
/// [`FactorScore::missing`]; the remaining weights are renormalized. Returns
/// `None` only when every sub-metric is missing.
#[must_use]
pub fn weighted_factor(
    factor: Factor,
    snapshot: &MetricSnapshot,
    ranker: &dyn PercentileRanker,
    weights: &[(Metric, f64)],
) -> Option<FactorScore> {
    let ranked = Ranked::collect(snapshot, ranker, weights);
    let value = ranked.average()?;
    ranked.into_score(factor, value)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic ranker for calculator tests.

    use ronda_traits::{Metric, MetricScore, MetricSnapshot, PercentileRanker, ScoringMethod};

    use crate::derive::{DerivationConfig, derive};

    /// Returns `percentile = raw` clamped to 0-100 (inverted for lower-is-better),
    /// tagged sector-relative.
    pub(crate) struct IdentityRanker;

    impl PercentileRanker for IdentityRanker {
        fn rank(&self, snapshot: &MetricSnapshot, metric: Metric) -> Option<MetricScore> {
            let raw = derive(metric, snapshot, &DerivationConfig::default())?;
            let clamped = raw.clamp(0.0, 100.0);
            Some(MetricScore {
                metric,
                raw,
                percentile: if metric.lower_is_better() {
                    100.0 - clamped
                } else {
                    clamped
                },
                method: ScoringMethod::SectorRelative,
                sample_count: 10,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::IdentityRanker;
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::Date;

    fn snapshot() -> MetricSnapshot {
        MetricSnapshot::new("TEST", "Technology", Date::from_ymd_opt(2024, 3, 29).unwrap())
    }

    #[test]
    fn test_missing_metric_renormalizes() {
        let mut s = snapshot();
        s.net_margin = Some(20.0);
        s.roe = Some(40.0);

        let score = weighted_factor(
            Factor::Profitability,
            &s,
            &IdentityRanker,
            &[
                (Metric::NetMargin, 0.25),
                (Metric::OperatingMargin, 0.25),
                (Metric::ReturnOnEquity, 0.25),
                (Metric::ReturnOnAssets, 0.25),
            ],
        )
        .unwrap();

        assert_relative_eq!(score.value, 30.0);
        assert_eq!(score.components.len(), 2);
        assert_eq!(
            score.missing,
            vec![Metric::OperatingMargin, Metric::ReturnOnAssets]
        );
        assert!(!score.is_complete());
    }

    #[test]
    fn test_all_missing_is_none() {
        let s = snapshot();
        assert!(
            weighted_factor(
                Factor::Growth,
                &s,
                &IdentityRanker,
                &[(Metric::RevenueGrowth, 0.5), (Metric::EpsGrowth, 0.5)],
            )
            .is_none()
        );
    }
}
