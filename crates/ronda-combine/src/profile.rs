//! Lifecycle weight profiles.
//!
//! Each lifecycle stage has a profile over the closed set of [`WeightSlot`]s
//! summing to one. The default profiles start from a common base allocation
//! and tilt it per stage: hypergrowth companies lean on growth and momentum,
//! value companies on valuation and dividends, turnarounds on balance-sheet
//! strength and smart money positioning.

use std::collections::BTreeMap;

use ronda_traits::{Factor, LifecycleStage, Result, RondaError, WeightSlot};
use serde::{Deserialize, Serialize};

/// Tolerance for weights summing to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Slot weights for one lifecycle stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightProfile {
    weights: BTreeMap<WeightSlot, f64>,
}

impl WeightProfile {
    /// Build a profile from `(slot, weight)` pairs. Use [`validate`](Self::validate)
    /// before relying on it.
    pub fn new(weights: impl IntoIterator<Item = (WeightSlot, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
        }
    }

    /// Weight of `slot`, zero if absent.
    #[must_use]
    pub fn weight(&self, slot: WeightSlot) -> f64 {
        self.weights.get(&slot).copied().unwrap_or(0.0)
    }

    /// Iterate over `(slot, weight)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (WeightSlot, f64)> + '_ {
        self.weights.iter().map(|(s, w)| (*s, *w))
    }

    /// Sum of all slot weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Scale every weight so the profile sums to one.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let total = self.total();
        if total > 0.0 {
            self.weights.values_mut().for_each(|w| *w /= total);
        }
        self
    }

    /// Check that the profile covers every slot with a finite, non-negative
    /// weight and sums to one.
    pub fn validate(&self) -> Result<()> {
        if let Some(slot) = WeightSlot::ALL
            .into_iter()
            .find(|s| !self.weights.contains_key(s))
        {
            return Err(RondaError::InvalidConfig(format!(
                "weight profile is missing slot {slot}"
            )));
        }
        if let Some((slot, w)) = self.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(RondaError::InvalidConfig(format!(
                "weight for {slot} must be finite and non-negative, got {w}"
            )));
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RondaError::InvalidConfig(format!(
                "weight profile sums to {total}, expected 1.0"
            )));
        }
        Ok(())
    }
}

/// Fixed internal split of the smart money slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartMoneyMix {
    /// Share of analyst consensus (default: 0.4)
    pub analyst_consensus: f64,

    /// Share of insider activity (default: 0.3)
    pub insider_activity: f64,

    /// Share of institutional ownership (default: 0.3)
    pub institutional_ownership: f64,
}

impl Default for SmartMoneyMix {
    fn default() -> Self {
        Self {
            analyst_consensus: 0.4,
            insider_activity: 0.3,
            institutional_ownership: 0.3,
        }
    }
}

impl SmartMoneyMix {
    /// Share of `factor` within the slot, zero for factors outside it.
    #[must_use]
    pub const fn share(&self, factor: Factor) -> f64 {
        match factor {
            Factor::AnalystConsensus => self.analyst_consensus,
            Factor::InsiderActivity => self.insider_activity,
            Factor::InstitutionalOwnership => self.institutional_ownership,
            _ => 0.0,
        }
    }

    /// Check that shares are non-negative and sum to one.
    pub fn validate(&self) -> Result<()> {
        let shares = [
            self.analyst_consensus,
            self.insider_activity,
            self.institutional_ownership,
        ];
        if shares.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(RondaError::InvalidConfig(
                "smart money shares must be finite and non-negative".into(),
            ));
        }
        let total: f64 = shares.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RondaError::InvalidConfig(format!(
                "smart money shares sum to {total}, expected 1.0"
            )));
        }
        Ok(())
    }
}

/// Weight profiles for every lifecycle stage plus the smart money split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Profile per stage
    pub profiles: BTreeMap<LifecycleStage, WeightProfile>,

    /// Internal split of the smart money slot
    pub smart_money: SmartMoneyMix,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            profiles: LifecycleStage::ALL
                .into_iter()
                .map(|stage| (stage, default_profile(stage)))
                .collect(),
            smart_money: SmartMoneyMix::default(),
        }
    }
}

impl WeightConfig {
    /// Profile for `stage`.
    pub fn profile(&self, stage: LifecycleStage) -> Result<&WeightProfile> {
        self.profiles.get(&stage).ok_or_else(|| {
            RondaError::InvalidConfig(format!("no weight profile for stage {stage}"))
        })
    }

    /// Validate every profile and the smart money split.
    pub fn validate(&self) -> Result<()> {
        for stage in LifecycleStage::ALL {
            self.profile(stage)?.validate().map_err(|e| {
                RondaError::InvalidConfig(format!("{stage} profile: {e}"))
            })?;
        }
        self.smart_money.validate()
    }
}

/// Base allocation shared by every stage before tilting.
const BASE: [(WeightSlot, f64); 9] = [
    (WeightSlot::Value, 0.11),
    (WeightSlot::Growth, 0.14),
    (WeightSlot::Profitability, 0.11),
    (WeightSlot::FinancialHealth, 0.10),
    (WeightSlot::Momentum, 0.08),
    (WeightSlot::SmartMoney, 0.27),
    (WeightSlot::NewsSentiment, 0.06),
    (WeightSlot::Technical, 0.08),
    (WeightSlot::DividendQuality, 0.05),
];

const fn tilt(stage: LifecycleStage, slot: WeightSlot) -> f64 {
    use LifecycleStage as L;
    use WeightSlot as S;

    match (stage, slot) {
        (L::Hypergrowth, S::Growth) => 1.5,
        (L::Hypergrowth, S::Momentum) => 1.3,
        (L::Hypergrowth, S::Profitability | S::DividendQuality) => 0.5,
        (L::Hypergrowth, S::Value) => 0.4,
        (L::Hypergrowth, S::FinancialHealth) => 0.8,

        (L::Growth, S::Growth) => 1.3,
        (L::Growth, S::Momentum) => 1.2,
        (L::Growth, S::Profitability) => 0.8,
        (L::Growth, S::Value) => 0.7,

        (L::Mature, S::Profitability | S::FinancialHealth | S::DividendQuality) => 1.2,
        (L::Mature, S::Value) => 1.1,
        (L::Mature, S::Growth) => 0.7,
        (L::Mature, S::Momentum) => 0.9,

        (L::Value, S::Value) => 1.4,
        (L::Value, S::DividendQuality) => 1.3,
        (L::Value, S::Profitability) => 1.2,
        (L::Value, S::FinancialHealth) => 1.1,
        (L::Value, S::Growth) => 0.5,
        (L::Value, S::Momentum) => 0.8,

        (L::Turnaround, S::FinancialHealth) => 1.4,
        (L::Turnaround, S::Momentum | S::SmartMoney) => 1.3,
        (L::Turnaround, S::Value) => 1.2,
        (L::Turnaround, S::Growth) => 0.6,
        (L::Turnaround, S::Profitability) => 0.7,

        _ => 1.0,
    }
}

/// Default profile for a stage: the base allocation tilted and renormalized.
#[must_use]
pub fn default_profile(stage: LifecycleStage) -> WeightProfile {
    WeightProfile::new(BASE.map(|(slot, w)| (slot, w * tilt(stage, slot)))).normalized()
}
