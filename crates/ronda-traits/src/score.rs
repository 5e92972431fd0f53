//! Scores produced by a run: metric percentiles, factor scores and the
//! persisted composite read model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Date, Factor, Metric, RondaError, Symbol};

/// How a percentile (or a factor built from percentiles) was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Ranked within the sector distribution.
    SectorRelative,
    /// Scored on a fixed benchmark curve because the sector sample was too small.
    AbsoluteBenchmark,
    /// A factor whose sub-metrics used both methods.
    Mixed,
}

impl ScoringMethod {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SectorRelative => "sector_relative",
            Self::AbsoluteBenchmark => "absolute_benchmark",
            Self::Mixed => "mixed",
        }
    }

    /// Method of a factor built from sub-metrics with the given methods.
    pub fn combine(methods: impl IntoIterator<Item = Self>) -> Option<Self> {
        methods.into_iter().reduce(|acc, m| if acc == m { acc } else { Self::Mixed })
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sector_relative" => Ok(Self::SectorRelative),
            "absolute_benchmark" => Ok(Self::AbsoluteBenchmark),
            "mixed" => Ok(Self::Mixed),
            _ => Err(RondaError::InvalidData(format!("unknown scoring method: {s}"))),
        }
    }
}

/// A direction-adjusted percentile for one metric of one security.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// The metric ranked.
    pub metric: Metric,
    /// Raw (derived) metric value.
    pub raw: f64,
    /// Percentile in [0, 100]; higher is always better.
    pub percentile: f64,
    /// Which ranking strategy produced the percentile.
    pub method: ScoringMethod,
    /// Finite sector observations behind the strategy.
    pub sample_count: usize,
}

/// One factor score for one security and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// The factor scored.
    pub factor: Factor,
    /// Score in [0, 100].
    pub value: f64,
    /// Method across the sub-metrics that were used.
    pub method: ScoringMethod,
    /// Sub-metric percentiles that went into the score.
    pub components: Vec<MetricScore>,
    /// Sub-metrics that were unavailable and left out of the average.
    pub missing: Vec<Metric>,
}

impl FactorScore {
    /// Whether every sub-metric of the factor was available.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Company lifecycle stage driving weight selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    /// Revenue growing at or above the hypergrowth cutoff.
    Hypergrowth,
    /// Strong but not hypergrowth revenue growth.
    Growth,
    /// Steady state; the default stage.
    Mature,
    /// Profitable, cheaply valued, not growing fast.
    Value,
    /// Shrinking revenue, or losses without strong growth.
    Turnaround,
}

impl LifecycleStage {
    /// Every stage.
    pub const ALL: [Self; 5] = [
        Self::Hypergrowth,
        Self::Growth,
        Self::Mature,
        Self::Value,
        Self::Turnaround,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hypergrowth => "hypergrowth",
            Self::Growth => "growth",
            Self::Mature => "mature",
            Self::Value => "value",
            Self::Turnaround => "turnaround",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| RondaError::InvalidData(format!("unknown lifecycle stage: {s}")))
    }
}

/// Confidence label derived from completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// Nearly every expected factor was scored.
    High,
    /// Most expected factors were scored.
    Medium,
    /// Many expected factors are missing.
    Low,
}

impl ConfidenceLevel {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            _ => Err(RondaError::InvalidData(format!("unknown confidence level: {s}"))),
        }
    }
}

/// Investment rating derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    /// Score of 80 or more.
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    /// Score in [65, 80).
    Buy,
    /// Score in [50, 65).
    Hold,
    /// Score in [35, 50).
    Underperform,
    /// Score below 35.
    Sell,
}

impl Rating {
    /// Rating for a 0-100 score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::StrongBuy
        } else if score >= 65.0 {
            Self::Buy
        } else if score >= 50.0 {
            Self::Hold
        } else if score >= 35.0 {
            Self::Underperform
        } else {
            Self::Sell
        }
    }

    /// Display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Underperform => "Underperform",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::StrongBuy, Self::Buy, Self::Hold, Self::Underperform, Self::Sell]
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| RondaError::InvalidData(format!("unknown rating: {s}")))
    }
}

/// Which stabilizer transition produced a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilizerTransition {
    /// No prior score existed; the raw score was stored unchanged.
    ColdStart,
    /// The raw score was blended with the previous stabilized score.
    Smoothed,
    /// A reset event bypassed smoothing.
    Reset,
}

impl StabilizerTransition {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ColdStart => "cold_start",
            Self::Smoothed => "smoothed",
            Self::Reset => "reset",
        }
    }
}

impl FromStr for StabilizerTransition {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cold_start" => Ok(Self::ColdStart),
            "smoothed" => Ok(Self::Smoothed),
            "reset" => Ok(Self::Reset),
            _ => Err(RondaError::InvalidData(format!("unknown transition: {s}"))),
        }
    }
}

/// The persisted composite score for one security and date.
///
/// This is the read model served downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Security symbol.
    pub symbol: Symbol,
    /// Sector at scoring time.
    pub sector: String,
    /// Run date.
    pub as_of: Date,
    /// Stabilized score in [0, 100].
    pub score: f64,
    /// Weighted composite before stabilization.
    pub raw_score: f64,
    /// Lifecycle stage used for weighting.
    pub lifecycle: LifecycleStage,
    /// Confidence in the lifecycle classification, in [0, 1].
    pub lifecycle_confidence: f64,
    /// Rating derived from `score`.
    pub rating: Rating,
    /// Weights actually applied, summing to 1.
    pub weights: BTreeMap<Factor, f64>,
    /// Percentage of expected factors that were scored.
    pub completeness: f64,
    /// Label derived from `completeness`.
    pub confidence: ConfidenceLevel,
    /// Stabilizer transition taken.
    pub transition: StabilizerTransition,
    /// Every factor score that was computed.
    pub factor_scores: Vec<FactorScore>,
    /// Full calculation detail for auditing.
    pub metadata: serde_json::Value,
    /// Version of the configuration the score was computed with.
    pub config_version: String,
}

impl CompositeScore {
    /// Look up a factor score.
    #[must_use]
    pub fn factor(&self, factor: Factor) -> Option<&FactorScore> {
        self.factor_scores.iter().find(|s| s.factor == factor)
    }
}
