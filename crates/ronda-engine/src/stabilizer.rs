//! Exponential smoothing of composite scores across runs.
//!
//! The stabilizer is a two-state machine keyed on whether a prior stabilized
//! score exists:
//!
//! | State | Event                | Output                          | Next |
//! |-------|----------------------|---------------------------------|------|
//! | Cold  | any                  | raw                             | Warm |
//! | Warm  | no pending reset     | `alpha * raw + (1 - alpha) * prev` | Warm |
//! | Warm  | reset event pending  | raw                             | Warm |
//!
//! A reset re-enters Warm with the raw score as the next run's previous
//! value. The first score of a security is never blended with a default.

use ronda_traits::{Result, RondaError, StabilizerTransition};
use serde::{Deserialize, Serialize};

/// Configuration for score smoothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Weight of the new raw score (default: 0.3)
    pub alpha: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self { alpha: 0.3 }
    }
}

impl StabilizerConfig {
    /// Check that `alpha` lies in `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(RondaError::InvalidConfig(format!(
                "smoothing alpha must lie in (0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Smoothing state of one security before a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizerState {
    /// No stabilized score has been persisted yet.
    Cold,
    /// The last persisted stabilized score.
    Warm {
        /// Stabilized score of the latest earlier run.
        previous: f64,
    },
}

impl StabilizerState {
    /// State implied by an optional previous score.
    #[must_use]
    pub fn from_previous(previous: Option<f64>) -> Self {
        match previous.filter(|p| p.is_finite()) {
            Some(previous) => Self::Warm { previous },
            None => Self::Cold,
        }
    }
}

/// Output of one smoothing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stabilized {
    /// Score to persist and report.
    pub score: f64,
    /// Transition taken.
    pub transition: StabilizerTransition,
}

/// Applies exponential smoothing with reset handling.
#[derive(Debug, Clone, Default)]
pub struct ScoreStabilizer {
    config: StabilizerConfig,
}

impl ScoreStabilizer {
    /// Create a stabilizer.
    #[must_use]
    pub const fn new(config: StabilizerConfig) -> Self {
        Self { config }
    }

    /// Smoothing factor in use.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.config.alpha
    }

    /// Advance the state machine with a new raw score.
    #[must_use]
    pub fn stabilize(&self, raw: f64, state: StabilizerState, reset_pending: bool) -> Stabilized {
        match state {
            StabilizerState::Cold => Stabilized {
                score: raw,
                transition: StabilizerTransition::ColdStart,
            },
            StabilizerState::Warm { .. } if reset_pending => Stabilized {
                score: raw,
                transition: StabilizerTransition::Reset,
            },
            StabilizerState::Warm { previous } => {
                let alpha = self.config.alpha;
                Stabilized {
                    score: (alpha * raw + (1.0 - alpha) * previous).clamp(0.0, 100.0),
                    transition: StabilizerTransition::Smoothed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cold_start_equals_raw() {
        let s = ScoreStabilizer::default();
        let out = s.stabilize(72.5, StabilizerState::from_previous(None), false);
        assert_eq!(out.score, 72.5);
        assert_eq!(out.transition, StabilizerTransition::ColdStart);

        // A pending reset on a cold security is still a plain cold start
        let out = s.stabilize(40.0, StabilizerState::Cold, true);
        assert_eq!(out.score, 40.0);
        assert_eq!(out.transition, StabilizerTransition::ColdStart);
    }

    #[test]
    fn test_smoothing() {
        let s = ScoreStabilizer::default();
        let out = s.stabilize(80.0, StabilizerState::Warm { previous: 50.0 }, false);
        assert_relative_eq!(out.score, 0.3 * 80.0 + 0.7 * 50.0, epsilon = 1e-12);
        assert_eq!(out.transition, StabilizerTransition::Smoothed);
    }

    #[test]
    fn test_reset_outputs_raw_and_becomes_previous() {
        let s = ScoreStabilizer::default();
        let reset = s.stabilize(20.0, StabilizerState::Warm { previous: 75.0 }, true);
        assert_eq!(reset.score, 20.0);
        assert_eq!(reset.transition, StabilizerTransition::Reset);

        let next = s.stabilize(30.0, StabilizerState::from_previous(Some(reset.score)), false);
        assert_relative_eq!(next.score, 0.3 * 30.0 + 0.7 * 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_output_stays_bounded() {
        let s = ScoreStabilizer::new(StabilizerConfig { alpha: 0.9 });
        for raw in [0.0, 33.0, 100.0] {
            for prev in [0.0, 50.0, 100.0] {
                let out = s.stabilize(raw, StabilizerState::Warm { previous: prev }, false);
                assert!((0.0..=100.0).contains(&out.score));
            }
        }
    }

    #[test]
    fn test_alpha_validation() {
        assert!(StabilizerConfig::default().validate().is_ok());
        assert!(StabilizerConfig { alpha: 1.0 }.validate().is_ok());
        assert!(StabilizerConfig { alpha: 0.0 }.validate().is_err());
        assert!(StabilizerConfig { alpha: f64::NAN }.validate().is_err());
    }
}
