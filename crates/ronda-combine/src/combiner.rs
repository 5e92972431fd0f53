//! Core trait definition for factor combiners.

use ndarray::Array1;
use ronda_traits::{FactorScore, Result, RondaError};

use crate::allocator::AppliedWeights;

/// Combines factor scores into a raw composite on the 0-100 scale.
///
/// All implementations must be thread-safe (Send + Sync) since one combiner is
/// shared by every worker of a run.
///
/// # Examples
///
/// ```rust,no_run
/// use ronda_combine::{AppliedWeights, Combiner};
/// use ronda_traits::FactorScore;
///
/// struct MaxCombiner;
///
/// impl Combiner for MaxCombiner {
///     fn combine(
///         &self,
///         scores: &[FactorScore],
///         _weights: &AppliedWeights,
///     ) -> ronda_traits::Result<f64> {
///         Ok(scores.iter().map(|s| s.value).fold(0.0, f64::max))
///     }
///
///     fn name(&self) -> &str {
///         "max"
///     }
/// }
/// ```
pub trait Combiner: Send + Sync {
    /// Combine factor scores under the given weights.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A weighted factor has no score
    /// - No factor carries weight
    /// - Combination produces a non-finite value
    fn combine(&self, scores: &[FactorScore], weights: &AppliedWeights) -> Result<f64>;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}

/// Weighted sum of factor scores.
///
/// With weights summing to one and every factor score in `[0, 100]`, the
/// composite stays in `[0, 100]`; it is clamped anyway against rounding.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSumCombiner;

impl WeightedSumCombiner {
    /// Create a new weighted-sum combiner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Combiner for WeightedSumCombiner {
    fn combine(&self, scores: &[FactorScore], weights: &AppliedWeights) -> Result<f64> {
        if weights.is_empty() {
            return Err(RondaError::InsufficientData(
                "cannot combine without weighted factors".into(),
            ));
        }

        let mut values = Vec::with_capacity(weights.len());
        let mut w = Vec::with_capacity(weights.len());
        for (factor, weight) in weights.iter() {
            let score = scores.iter().find(|s| s.factor == factor).ok_or_else(|| {
                RondaError::InvalidData(format!("weighted factor {factor} has no score"))
            })?;
            values.push(score.value);
            w.push(weight);
        }

        let composite = Array1::from_vec(values).dot(&Array1::from_vec(w));
        if !composite.is_finite() {
            return Err(RondaError::InvalidData(
                "combination produced a non-finite composite".into(),
            ));
        }

        Ok(composite.clamp(0.0, 100.0))
    }

    fn name(&self) -> &str {
        "weighted_sum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::WeightAllocator;
    use approx::assert_relative_eq;
    use ronda_traits::{Factor, LifecycleStage, ScoringMethod};
    use std::collections::BTreeSet;

    fn score(factor: Factor, value: f64) -> FactorScore {
        FactorScore {
            factor,
            value,
            method: ScoringMethod::SectorRelative,
            components: vec![],
            missing: vec![],
        }
    }

    #[test]
    fn test_constant_scores_combine_to_constant() {
        let scores: Vec<FactorScore> = Factor::CORE.iter().map(|f| score(*f, 62.0)).collect();
        let available: BTreeSet<Factor> = Factor::CORE.into_iter().collect();
        let weights = WeightAllocator::default()
            .allocate(LifecycleStage::Growth, &available)
            .unwrap();

        let composite = WeightedSumCombiner.combine(&scores, &weights).unwrap();
        assert_relative_eq!(composite, 62.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weighted_sum() {
        let scores = vec![score(Factor::Value, 80.0), score(Factor::Growth, 20.0)];
        let available: BTreeSet<Factor> = [Factor::Value, Factor::Growth].into_iter().collect();
        let weights = WeightAllocator::default()
            .allocate(LifecycleStage::Mature, &available)
            .unwrap();

        let expected =
            80.0 * weights.weight(Factor::Value) + 20.0 * weights.weight(Factor::Growth);
        let composite = WeightedSumCombiner::new().combine(&scores, &weights).unwrap();
        assert_relative_eq!(composite, expected, epsilon = 1e-12);
        assert!((0.0..=100.0).contains(&composite));
    }

    #[test]
    fn test_missing_score_is_error() {
        let available: BTreeSet<Factor> = [Factor::Value, Factor::Growth].into_iter().collect();
        let weights = WeightAllocator::default()
            .allocate(LifecycleStage::Mature, &available)
            .unwrap();
        assert!(WeightedSumCombiner.combine(&[score(Factor::Value, 50.0)], &weights).is_err());
        assert!(WeightedSumCombiner.combine(&[], &AppliedWeights::default()).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(WeightedSumCombiner.name(), "weighted_sum");
    }
}
