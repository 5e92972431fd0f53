//! Data completeness and confidence.

use std::collections::BTreeSet;

use ronda_traits::{ConfidenceLevel, Factor, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Completeness bands and the minimum data needed to score at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessConfig {
    /// Completeness (%) at or above which confidence is High (default: 90)
    pub high_threshold: f64,

    /// Completeness (%) at or above which confidence is Medium (default: 70)
    pub medium_threshold: f64,

    /// Completeness (%) below which a security is not scored (default: 40)
    pub min_completeness: f64,

    /// Minimum fundamental factors (value, growth, profitability,
    /// financial health) required to score (default: 2)
    pub min_core_factors: usize,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            high_threshold: 90.0,
            medium_threshold: 70.0,
            min_completeness: 40.0,
            min_core_factors: 2,
        }
    }
}

impl CompletenessConfig {
    /// Check that the bands are ordered and in range.
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !(in_range(self.high_threshold)
            && in_range(self.medium_threshold)
            && in_range(self.min_completeness))
        {
            return Err(RondaError::InvalidConfig(
                "completeness thresholds must lie in [0, 100]".into(),
            ));
        }
        if self.medium_threshold > self.high_threshold {
            return Err(RondaError::InvalidConfig(format!(
                "medium threshold {} exceeds high threshold {}",
                self.medium_threshold, self.high_threshold
            )));
        }
        if self.min_core_factors > Factor::FUNDAMENTAL.len() {
            return Err(RondaError::InvalidConfig(format!(
                "min_core_factors {} exceeds the {} fundamental factors",
                self.min_core_factors,
                Factor::FUNDAMENTAL.len()
            )));
        }
        Ok(())
    }
}

/// Completeness of one security's factor set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    /// Scored share of expected factors, 0-100.
    pub percent: f64,
    /// Confidence label for `percent`.
    pub level: ConfidenceLevel,
    /// Number of expected factors.
    pub expected: usize,
    /// Expected factors that were scored.
    pub scored: usize,
    /// Expected factors without a score.
    pub missing: Vec<Factor>,
    /// Fundamental factors that were scored.
    pub core_scored: usize,
}

/// Computes completeness and decides whether a security has enough data.
///
/// The expected set is the ten core factors, plus dividend quality for
/// dividend payers. A non-payer therefore reaches 100% without a dividend
/// score.
#[derive(Debug, Clone, Default)]
pub struct CompletenessEstimator {
    config: CompletenessConfig,
}

impl CompletenessEstimator {
    /// Create an estimator.
    #[must_use]
    pub const fn new(config: CompletenessConfig) -> Self {
        Self { config }
    }

    /// Factors expected for a security.
    #[must_use]
    pub fn expected(pays_dividend: bool) -> Vec<Factor> {
        let mut expected = Factor::CORE.to_vec();
        if pays_dividend {
            expected.push(Factor::DividendQuality);
        }
        expected
    }

    /// Confidence label for a completeness percentage.
    #[must_use]
    pub fn level(&self, percent: f64) -> ConfidenceLevel {
        if percent >= self.config.high_threshold {
            ConfidenceLevel::High
        } else if percent >= self.config.medium_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Assess completeness of the `scored` factors.
    #[must_use]
    pub fn assess(&self, pays_dividend: bool, scored: &BTreeSet<Factor>) -> Completeness {
        let expected = Self::expected(pays_dividend);
        let (present, missing): (Vec<Factor>, Vec<Factor>) =
            expected.iter().partition(|f| scored.contains(*f));

        let percent = (present.len() as f64 / expected.len() as f64 * 100.0).min(100.0);
        let core_scored = Factor::FUNDAMENTAL
            .iter()
            .filter(|f| scored.contains(*f))
            .count();

        Completeness {
            percent,
            level: self.level(percent),
            expected: expected.len(),
            scored: present.len(),
            missing,
            core_scored,
        }
    }

    /// Reject a security that lacks the minimum data to be scored.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InsufficientData`] below the completeness floor
    /// or with too few fundamental factors.
    pub fn check_sufficient(&self, completeness: &Completeness) -> Result<()> {
        if completeness.percent < self.config.min_completeness {
            return Err(RondaError::InsufficientData(format!(
                "completeness {:.1}% below minimum {:.1}%",
                completeness.percent, self.config.min_completeness
            )));
        }
        if completeness.core_scored < self.config.min_core_factors {
            return Err(RondaError::InsufficientData(format!(
                "{} of {} required fundamental factors scored",
                completeness.core_scored, self.config.min_core_factors
            )));
        }
        Ok(())
    }
}
