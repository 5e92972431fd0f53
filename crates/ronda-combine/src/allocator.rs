//! Weight allocation with redistribution over missing factors.

use std::collections::{BTreeMap, BTreeSet};

use ronda_traits::{Factor, LifecycleStage, Result, RondaError, WeightSlot};
use serde::{Deserialize, Serialize};

use crate::profile::{WEIGHT_SUM_TOLERANCE, WeightConfig};

/// Per-factor weights applied to one security, summing to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedWeights {
    weights: BTreeMap<Factor, f64>,
}

impl AppliedWeights {
    /// Weight of `factor`, zero when it was not scored.
    #[must_use]
    pub fn weight(&self, factor: Factor) -> f64 {
        self.weights.get(&factor).copied().unwrap_or(0.0)
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Iterate over `(factor, weight)` in factor order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.weights.iter().map(|(f, w)| (*f, *w))
    }

    /// Number of weighted factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no factor carries weight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<Factor, f64> {
        &self.weights
    }

    /// Consume into the underlying map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<Factor, f64> {
        self.weights
    }
}

/// Turns a lifecycle profile into per-factor weights for the factors that
/// were actually scored.
///
/// Inside the smart money slot, missing members are dropped and the fixed
/// internal split is renormalized over the rest. Across slots, the weight of
/// every missing slot is redistributed proportionally over the present ones.
/// The result always sums to one.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
///
/// use ronda_combine::allocator::WeightAllocator;
/// use ronda_traits::{Factor, LifecycleStage};
///
/// let allocator = WeightAllocator::default();
/// let scored: BTreeSet<Factor> = [Factor::Value, Factor::Growth, Factor::AnalystConsensus]
///     .into_iter()
///     .collect();
///
/// let weights = allocator.allocate(LifecycleStage::Mature, &scored).unwrap();
/// assert!((weights.total() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeightAllocator {
    config: WeightConfig,
}

impl WeightAllocator {
    /// Create an allocator. The configuration should already be validated.
    #[must_use]
    pub const fn new(config: WeightConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// Internal shares of the present members of `slot`, summing to one.
    fn member_shares(&self, slot: WeightSlot, available: &BTreeSet<Factor>) -> Vec<(Factor, f64)> {
        let present: Vec<Factor> = slot
            .members()
            .iter()
            .copied()
            .filter(|f| available.contains(f))
            .collect();

        if slot != WeightSlot::SmartMoney {
            return present.into_iter().map(|f| (f, 1.0)).collect();
        }

        let mix = &self.config.smart_money;
        let total: f64 = present.iter().map(|f| mix.share(*f)).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        present
            .into_iter()
            .map(|f| (f, mix.share(f) / total))
            .filter(|(_, share)| *share > 0.0)
            .collect()
    }

    /// Allocate weights for `stage` over the `available` factors.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InsufficientData`] when no available factor has
    /// positive weight in the profile.
    pub fn allocate(
        &self,
        stage: LifecycleStage,
        available: &BTreeSet<Factor>,
    ) -> Result<AppliedWeights> {
        let profile = self.config.profile(stage)?;

        let present: Vec<(f64, Vec<(Factor, f64)>)> = profile
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(slot, w)| (w, self.member_shares(slot, available)))
            .filter(|(_, members)| !members.is_empty())
            .collect();

        let total: f64 = present.iter().map(|(w, _)| w).sum();
        if total <= 0.0 {
            return Err(RondaError::InsufficientData(format!(
                "no weighted factor available for {stage} profile"
            )));
        }

        let weights: BTreeMap<Factor, f64> = present
            .into_iter()
            .flat_map(|(w, members)| {
                members
                    .into_iter()
                    .map(move |(factor, share)| (factor, w / total * share))
            })
            .collect();

        let applied = AppliedWeights { weights };
        debug_assert!((applied.total() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::default_profile;
    use approx::assert_relative_eq;

    fn all_core() -> BTreeSet<Factor> {
        Factor::CORE.into_iter().collect()
    }

    #[test]
    fn test_full_set_matches_profile() {
        let allocator = WeightAllocator::default();
        let mut available = all_core();
        available.insert(Factor::DividendQuality);

        let weights = allocator.allocate(LifecycleStage::Mature, &available).unwrap();
        let profile = default_profile(LifecycleStage::Mature);

        assert_relative_eq!(weights.total(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            weights.weight(Factor::Value),
            profile.weight(WeightSlot::Value),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            weights.weight(Factor::AnalystConsensus),
            profile.weight(WeightSlot::SmartMoney) * 0.4,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_insider_renormalizes_inside_slot() {
        let allocator = WeightAllocator::default();
        let mut available = all_core();
        available.remove(&Factor::InsiderActivity);

        let weights = allocator.allocate(LifecycleStage::Growth, &available).unwrap();
        let slot = weights.weight(Factor::AnalystConsensus)
            + weights.weight(Factor::InstitutionalOwnership);

        assert_relative_eq!(weights.total(), 1.0, epsilon = 1e-9);
        assert_eq!(weights.weight(Factor::InsiderActivity), 0.0);
        assert_relative_eq!(weights.weight(Factor::AnalystConsensus) / slot, 0.4 / 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_slot_redistributes_proportionally() {
        let allocator = WeightAllocator::default();
        let full = allocator.allocate(LifecycleStage::Value, &all_core()).unwrap();

        let mut available = all_core();
        available.remove(&Factor::NewsSentiment);
        let partial = allocator.allocate(LifecycleStage::Value, &available).unwrap();

        let scale = 1.0 / (1.0 - full.weight(Factor::NewsSentiment));
        for (factor, w) in full.iter().filter(|(f, _)| *f != Factor::NewsSentiment) {
            assert_relative_eq!(partial.weight(factor), w * scale, epsilon = 1e-12);
        }
        assert_relative_eq!(partial.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_every_subset_sums_to_one() {
        let allocator = WeightAllocator::default();
        let factors = Factor::ALL;
        for mask in 1u32..(1 << factors.len()) {
            let available: BTreeSet<Factor> = factors
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| *f)
                .collect();
            for stage in LifecycleStage::ALL {
                let weights = allocator.allocate(stage, &available).unwrap();
                assert_relative_eq!(weights.total(), 1.0, epsilon = 1e-9);
                assert!(weights.iter().all(|(f, w)| w >= 0.0 && available.contains(&f)));
            }
        }
    }

    #[test]
    fn test_nothing_available() {
        let allocator = WeightAllocator::default();
        let err = allocator
            .allocate(LifecycleStage::Mature, &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }
}
