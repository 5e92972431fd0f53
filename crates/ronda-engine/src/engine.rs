//! Per-security scoring pipeline.
//!
//! factor scores → completeness gate → lifecycle → weights → raw composite,
//! then stabilization against the previous persisted score.

use std::collections::BTreeSet;

use ronda_combine::lifecycle::LifecycleInputs;
use ronda_combine::{
    AppliedWeights, Classification, Combiner, Completeness, CompletenessEstimator,
    LifecycleClassifier, WeightAllocator, WeightedSumCombiner,
};
use ronda_traits::{
    CompositeScore, Date, Factor, FactorCalculator, FactorScore, MetricSnapshot,
    PercentileRanker, Rating, Result, Symbol,
};
use serde_json::json;

use crate::config::EngineConfig;
use crate::stabilizer::{ScoreStabilizer, Stabilized, StabilizerState};

/// Everything computed for one security before stabilization.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Security symbol.
    pub symbol: Symbol,
    /// Sector the security was ranked in.
    pub sector: String,
    /// Snapshot date.
    pub as_of: Date,
    /// Whether the dividend factor was expected.
    pub pays_dividend: bool,
    /// Factor scores that could be computed.
    pub factor_scores: Vec<FactorScore>,
    /// Completeness of `factor_scores`.
    pub completeness: Completeness,
    /// Lifecycle inputs used by the classifier.
    pub lifecycle_inputs: LifecycleInputs,
    /// Lifecycle stage and confidence.
    pub classification: Classification,
    /// Weights applied to `factor_scores`.
    pub weights: AppliedWeights,
    /// Weighted composite before smoothing.
    pub raw_score: f64,
}

/// Scores one security at a time against shared, read-only run state.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::{EngineConfig, ScoringEngine};
///
/// let engine = ScoringEngine::from_config(&EngineConfig::default());
/// let evaluation = engine.evaluate(&snapshot, stats.as_ref())?;
/// let score = engine.finalize(evaluation, as_of, previous, false);
/// ```
pub struct ScoringEngine {
    calculators: Vec<Box<dyn FactorCalculator>>,
    classifier: LifecycleClassifier,
    allocator: WeightAllocator,
    combiner: Box<dyn Combiner>,
    completeness: CompletenessEstimator,
    stabilizer: ScoreStabilizer,
    min_dividend_yield: f64,
    config_version: String,
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("calculators", &self.calculators.len())
            .field("combiner", &self.combiner.name())
            .field("alpha", &self.stabilizer.alpha())
            .field("config_version", &self.config_version)
            .finish()
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ScoringEngine {
    /// Build every component from a validated configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            calculators: config.calculators.build(),
            classifier: LifecycleClassifier::new(config.lifecycle.clone()),
            allocator: WeightAllocator::new(config.weights.clone()),
            combiner: Box::new(WeightedSumCombiner::new()),
            completeness: CompletenessEstimator::new(config.completeness.clone()),
            stabilizer: ScoreStabilizer::new(config.stabilizer.clone()),
            min_dividend_yield: config.normalizer.derivation.min_dividend_yield,
            config_version: config.version.clone(),
        }
    }

    /// Replace the combination strategy.
    #[must_use]
    pub fn with_combiner(mut self, combiner: Box<dyn Combiner>) -> Self {
        self.combiner = combiner;
        self
    }

    /// Every factor score that can be computed for `snapshot`.
    ///
    /// Dividend quality is only attempted for dividend payers.
    pub fn factor_scores(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Vec<FactorScore> {
        let pays_dividend = snapshot.pays_dividend(self.min_dividend_yield);
        self.calculators
            .iter()
            .filter(|c| pays_dividend || c.factor() != Factor::DividendQuality)
            .filter_map(|calc| {
                let score = calc.calculate(snapshot, ranker);
                if score.is_none() {
                    tracing::debug!(
                        symbol = snapshot.symbol(),
                        factor = calc.name(),
                        "factor unavailable"
                    );
                }
                score
            })
            .collect()
    }

    /// Compute the raw composite for one security.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InsufficientData`](ronda_traits::RondaError::InsufficientData)
    /// when too few factors could be scored.
    pub fn evaluate(
        &self,
        snapshot: &MetricSnapshot,
        ranker: &dyn PercentileRanker,
    ) -> Result<Evaluation> {
        let pays_dividend = snapshot.pays_dividend(self.min_dividend_yield);
        let factor_scores = self.factor_scores(snapshot, ranker);
        let available: BTreeSet<Factor> = factor_scores.iter().map(|s| s.factor).collect();

        let completeness = self.completeness.assess(pays_dividend, &available);
        self.completeness.check_sufficient(&completeness)?;

        let lifecycle_inputs = LifecycleInputs::from_snapshot(snapshot);
        let classification = self.classifier.classify(&lifecycle_inputs);
        let weights = self.allocator.allocate(classification.stage, &available)?;
        let raw_score = self.combiner.combine(&factor_scores, &weights)?;

        Ok(Evaluation {
            symbol: snapshot.symbol().to_string(),
            sector: snapshot.sector().to_string(),
            as_of: snapshot.as_of,
            pays_dividend,
            factor_scores,
            completeness,
            lifecycle_inputs,
            classification,
            weights,
            raw_score,
        })
    }

    /// Stabilize an evaluation into the persisted score for `run_date`.
    #[must_use]
    pub fn finalize(
        &self,
        evaluation: Evaluation,
        run_date: Date,
        previous: Option<f64>,
        reset_pending: bool,
    ) -> CompositeScore {
        let state = StabilizerState::from_previous(previous);
        let Stabilized { score, transition } =
            self.stabilizer
                .stabilize(evaluation.raw_score, state, reset_pending);

        let inputs = &evaluation.lifecycle_inputs;
        let metadata = json!({
            "combiner": self.combiner.name(),
            "snapshot_as_of": evaluation.as_of,
            "pays_dividend": evaluation.pays_dividend,
            "lifecycle_inputs": {
                "revenue_growth": inputs.revenue_growth,
                "net_margin": inputs.net_margin,
                "pe_ratio": inputs.pe_ratio,
            },
            "completeness": {
                "expected": evaluation.completeness.expected,
                "scored": evaluation.completeness.scored,
                "missing": evaluation.completeness.missing,
            },
            "stabilizer": {
                "alpha": self.stabilizer.alpha(),
                "previous": previous,
                "reset_pending": reset_pending,
            },
        });

        CompositeScore {
            symbol: evaluation.symbol,
            sector: evaluation.sector,
            as_of: run_date,
            score,
            raw_score: evaluation.raw_score,
            lifecycle: evaluation.classification.stage,
            lifecycle_confidence: evaluation.classification.confidence,
            rating: Rating::from_score(score),
            weights: evaluation.weights.into_map(),
            completeness: evaluation.completeness.percent,
            confidence: evaluation.completeness.level,
            transition,
            factor_scores: evaluation.factor_scores,
            metadata,
            config_version: self.config_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_signals::{NormalizerConfig, SectorStatistics};
    use ronda_traits::{LifecycleStage, RondaError, ScoringMethod, StabilizerTransition};

    use crate::testing::{as_of as date, full_snapshot};

    fn stats(snapshots: &[MetricSnapshot]) -> SectorStatistics {
        SectorStatistics::build(date(), snapshots, NormalizerConfig::default())
    }

    #[test]
    fn test_evaluate_full_snapshot() {
        let universe: Vec<MetricSnapshot> = (1..=6)
            .map(|i| full_snapshot(&format!("S{i}"), "Tech", 0.7 + 0.1 * i as f64))
            .collect();
        let stats = stats(&universe);
        let engine = ScoringEngine::default();

        let eval = engine.evaluate(&universe[2], &stats).unwrap();
        assert!(!eval.pays_dividend);
        assert_eq!(eval.factor_scores.len(), 10);
        assert_relative_eq!(eval.completeness.percent, 100.0);
        assert_relative_eq!(eval.weights.total(), 1.0, epsilon = 1e-9);
        assert!((0.0..=100.0).contains(&eval.raw_score));
        assert!(
            eval.factor_scores
                .iter()
                .all(|f| f.method == ScoringMethod::SectorRelative)
        );
    }

    #[test]
    fn test_small_sector_uses_benchmarks() {
        let universe = vec![full_snapshot("A", "Tech", 1.0), full_snapshot("B", "Tech", 1.2)];
        let stats = stats(&universe);
        let eval = ScoringEngine::default().evaluate(&universe[0], &stats).unwrap();
        assert!(
            eval.factor_scores
                .iter()
                .all(|f| f.method == ScoringMethod::AbsoluteBenchmark)
        );
    }

    #[test]
    fn test_thin_snapshot_is_insufficient() {
        let mut thin = MetricSnapshot::new("THIN", "Tech", date());
        thin.return_1m = Some(3.0);
        thin.rsi = Some(40.0);
        let stats = stats(std::slice::from_ref(&thin));

        let err = ScoringEngine::default().evaluate(&thin, &stats).unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    #[test]
    fn test_dividend_payer_expects_dividend_factor() {
        let mut payer = full_snapshot("KO", "Tech", 1.0);
        payer.dividend_yield = Some(3.0);
        payer.payout_ratio = Some(60.0);
        payer.dividend_growth = Some(4.0);
        payer.dividend_streak = Some(30);
        let stats = stats(std::slice::from_ref(&payer));

        let eval = ScoringEngine::default().evaluate(&payer, &stats).unwrap();
        assert!(eval.pays_dividend);
        assert_eq!(eval.completeness.expected, 11);
        assert!(eval.weights.weight(Factor::DividendQuality) > 0.0);
    }

    #[test]
    fn test_finalize_transitions() {
        let universe = vec![full_snapshot("A", "Tech", 1.0)];
        let stats = stats(&universe);
        let engine = ScoringEngine::default();
        let eval = engine.evaluate(&universe[0], &stats).unwrap();
        let raw = eval.raw_score;

        let cold = engine.finalize(eval.clone(), date(), None, false);
        assert_eq!(cold.transition, StabilizerTransition::ColdStart);
        assert_relative_eq!(cold.score, raw);
        assert_eq!(cold.rating, Rating::from_score(raw));
        assert_eq!(cold.config_version, "v1");
        assert_eq!(cold.metadata["combiner"], "weighted_sum");

        let smoothed = engine.finalize(eval.clone(), date(), Some(20.0), false);
        assert_eq!(smoothed.transition, StabilizerTransition::Smoothed);
        assert_relative_eq!(smoothed.score, 0.3 * raw + 0.7 * 20.0, epsilon = 1e-9);
        assert_relative_eq!(smoothed.raw_score, raw);

        let reset = engine.finalize(eval, date(), Some(20.0), true);
        assert_eq!(reset.transition, StabilizerTransition::Reset);
        assert_relative_eq!(reset.score, raw);
    }

    #[test]
    fn test_lifecycle_drives_weights() {
        let mut hyper = full_snapshot("HYPER", "Tech", 1.0);
        hyper.revenue_quarters = vec![200.0, 170.0, 140.0, 120.0, 100.0];
        let stats = stats(std::slice::from_ref(&hyper));

        let eval = ScoringEngine::default().evaluate(&hyper, &stats).unwrap();
        assert_eq!(eval.classification.stage, LifecycleStage::Hypergrowth);
        assert!(eval.weights.weight(Factor::Growth) > eval.weights.weight(Factor::Value));
    }
}
