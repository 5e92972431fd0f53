//! Factor calculator trait and the percentile seam it depends on.
//!
//! Calculators never see how a percentile was produced. They ask a
//! [`PercentileRanker`] for a metric of a snapshot and receive a
//! direction-adjusted [`MetricScore`], whether it came from a sector
//! distribution or from the absolute-benchmark fallback.

use crate::{Factor, FactorScore, Metric, MetricScore, MetricSnapshot};

/// Ranks one metric of one security against its sector.
///
/// Implementations are built once per run and shared read-only across
/// workers, so they must be `Send + Sync`.
pub trait PercentileRanker: Send + Sync {
    /// Derive `metric` from `snapshot` and rank it within the snapshot's sector.
    ///
    /// Returns `None` when the metric is unavailable for the security (missing
    /// or non-finite inputs). It never substitutes a default percentile.
    fn rank(&self, snapshot: &MetricSnapshot, metric: Metric) -> Option<MetricScore>;
}

/// Computes one factor score from ranked sub-metrics.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::{
///     Factor, FactorCalculator, FactorScore, Metric, MetricSnapshot, PercentileRanker,
///     ScoringMethod,
/// };
///
/// struct RoeOnly;
///
/// impl FactorCalculator for RoeOnly {
///     fn factor(&self) -> Factor {
///         Factor::Profitability
///     }
///
///     fn metrics(&self) -> &[Metric] {
///         &[Metric::ReturnOnEquity]
///     }
///
///     fn calculate(
///         &self,
///         snapshot: &MetricSnapshot,
///         ranker: &dyn PercentileRanker,
///     ) -> Option<FactorScore> {
///         let roe = ranker.rank(snapshot, Metric::ReturnOnEquity)?;
///         Some(FactorScore {
///             factor: Factor::Profitability,
///             value: roe.percentile,
///             method: roe.method,
///             components: vec![roe],
///             missing: vec![],
///         })
///     }
/// }
/// ```
pub trait FactorCalculator: Send + Sync {
    /// The factor this calculator produces.
    fn factor(&self) -> Factor;

    /// Name used in logs and metadata.
    fn name(&self) -> &str {
        self.factor().as_str()
    }

    /// Sub-metrics the factor is built from.
    fn metrics(&self) -> &[Metric];

    /// Score the factor for one security.
    ///
    /// Missing sub-metrics are left out of the average and listed in
    /// [`FactorScore::missing`]. Returns `None` only when every sub-metric is
    /// unavailable.
    fn calculate(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Option<FactorScore>;
}
