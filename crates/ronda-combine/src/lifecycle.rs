//! Company lifecycle classification.
//!
//! A security's stage selects the weight profile used for its composite.
//! Classification is a total function of revenue growth, net margin and P/E;
//! every band is half-open with an inclusive lower bound.

use ronda_traits::stats::year_over_year_growth;
use ronda_traits::{LifecycleStage, MetricSnapshot, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Stage thresholds, in percent (P/E as a multiple).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleThresholds {
    /// Revenue growth at or above which a company is hypergrowth (default: 50)
    pub hypergrowth_growth: f64,

    /// Revenue growth at or above which a company is growth (default: 20)
    pub growth_growth: f64,

    /// Revenue growth below which a company is turnaround (default: -5)
    pub decline_growth: f64,

    /// Minimum net margin for the value stage (default: 5)
    pub value_min_margin: f64,

    /// P/E below which a profitable company is value (default: 12)
    pub value_max_pe: f64,
}

impl Default for LifecycleThresholds {
    fn default() -> Self {
        Self {
            hypergrowth_growth: 50.0,
            growth_growth: 20.0,
            decline_growth: -5.0,
            value_min_margin: 5.0,
            value_max_pe: 12.0,
        }
    }
}

impl LifecycleThresholds {
    /// Check that the bands are ordered.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.decline_growth < self.growth_growth
            && self.growth_growth < self.hypergrowth_growth;
        if !ordered {
            return Err(RondaError::InvalidConfig(format!(
                "lifecycle growth bands must satisfy decline < growth < hypergrowth, got {} / {} / {}",
                self.decline_growth, self.growth_growth, self.hypergrowth_growth
            )));
        }
        if self.value_max_pe <= 0.0 {
            return Err(RondaError::InvalidConfig(
                "value_max_pe must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Inputs to the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LifecycleInputs {
    /// Year-over-year revenue growth (%).
    pub revenue_growth: Option<f64>,
    /// Net margin (%).
    pub net_margin: Option<f64>,
    /// Price-to-earnings ratio.
    pub pe_ratio: Option<f64>,
}

impl LifecycleInputs {
    /// Extract inputs from a snapshot. Non-finite values count as missing.
    #[must_use]
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Self {
            revenue_growth: year_over_year_growth(&snapshot.revenue_quarters),
            net_margin: finite(snapshot.net_margin),
            pe_ratio: finite(snapshot.pe_ratio),
        }
    }
}

/// Classified stage with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Lifecycle stage.
    pub stage: LifecycleStage,
    /// How clearly the inputs place the company in the stage.
    pub confidence: f64,
}

/// Deterministic lifecycle classifier.
///
/// Rules, first match wins:
///
/// 1. growth ≥ hypergrowth cutoff: hypergrowth (margin ignored)
/// 2. growth ≥ growth cutoff: growth
/// 3. growth < decline cutoff: turnaround
/// 4. net margin < 0: turnaround
/// 5. net margin ≥ value margin and 0 < P/E < value P/E: value
/// 6. otherwise mature
///
/// Missing growth never triggers rules 1-3; missing margin or P/E disable the
/// rules that need them.
///
/// # Example
///
/// ```
/// use ronda_combine::lifecycle::{LifecycleClassifier, LifecycleInputs};
/// use ronda_traits::LifecycleStage;
///
/// let classifier = LifecycleClassifier::default();
/// let inputs = LifecycleInputs {
///     revenue_growth: Some(65.0),
///     net_margin: Some(-30.0),
///     pe_ratio: None,
/// };
///
/// assert_eq!(classifier.classify(&inputs).stage, LifecycleStage::Hypergrowth);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LifecycleClassifier {
    thresholds: LifecycleThresholds,
}

impl LifecycleClassifier {
    /// Create a classifier with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: LifecycleThresholds) -> Self {
        Self { thresholds }
    }

    /// Get the thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &LifecycleThresholds {
        &self.thresholds
    }

    /// Classify a company.
    #[must_use]
    pub fn classify(&self, inputs: &LifecycleInputs) -> Classification {
        let t = &self.thresholds;
        let growth = inputs.revenue_growth;
        let margin = inputs.net_margin;

        let (stage, confidence) = match growth {
            Some(g) if g >= t.hypergrowth_growth => (
                LifecycleStage::Hypergrowth,
                (g - t.hypergrowth_growth) / t.hypergrowth_growth.abs().max(1.0) + 0.7,
            ),
            Some(g) if g >= t.growth_growth => {
                let span = (t.hypergrowth_growth - t.growth_growth) * 2.0;
                (LifecycleStage::Growth, 0.6 + (g - t.growth_growth) / span)
            }
            Some(g) if g < t.decline_growth => (LifecycleStage::Turnaround, g.abs() / 20.0 + 0.5),
            _ if margin.is_some_and(|m| m < 0.0) => (
                LifecycleStage::Turnaround,
                growth.unwrap_or(0.0).abs() / 20.0 + 0.5,
            ),
            _ => match (margin, inputs.pe_ratio) {
                (Some(m), Some(pe))
                    if m >= t.value_min_margin && pe > 0.0 && pe < t.value_max_pe =>
                {
                    (
                        LifecycleStage::Value,
                        0.5 + (t.value_max_pe - pe) / t.value_max_pe * 0.3 + (m / 20.0).min(0.5),
                    )
                }
                _ => {
                    let steady = growth.is_some_and(|g| g > 0.0 && g < 15.0)
                        && margin.is_some_and(|m| m > 0.0);
                    (LifecycleStage::Mature, if steady { 0.8 } else { 0.6 })
                }
            },
        };

        Classification {
            stage,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Classify a snapshot.
    #[must_use]
    pub fn classify_snapshot(&self, snapshot: &MetricSnapshot) -> Classification {
        self.classify(&LifecycleInputs::from_snapshot(snapshot))
    }
}
