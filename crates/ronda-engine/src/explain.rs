//! Score change explanations.
//!
//! Compares a persisted score with the one stored before it and attributes
//! the move to factors. A factor's contribution is its score delta times the
//! weight it carried, so the largest contributions are the ones that moved
//! the composite most.

use ronda_combine::CompletenessEstimator;
use ronda_traits::{
    CompositeScore, ConfidenceLevel, Date, Factor, Metric, Result, RondaError, ScoreStore,
    ScoringMethod, StabilizerTransition, Symbol,
};
use serde::{Deserialize, Serialize};

/// Configuration for score change explanations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Smallest factor move, in points, worth reporting (default: 3.0)
    pub significant_delta: f64,

    /// Number of factor changes kept (default: 5)
    pub max_reasons: usize,

    /// Score assumed for a factor missing on one side (default: 50.0)
    pub neutral_score: f64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            significant_delta: 3.0,
            max_reasons: 5,
            neutral_score: 50.0,
        }
    }
}

impl ExplainerConfig {
    /// Check thresholds.
    pub fn validate(&self) -> Result<()> {
        if !self.significant_delta.is_finite() || self.significant_delta < 0.0 {
            return Err(RondaError::InvalidConfig(
                "significant_delta must be finite and non-negative".into(),
            ));
        }
        if self.max_reasons == 0 {
            return Err(RondaError::InvalidConfig(
                "max_reasons must be at least 1".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.neutral_score) {
            return Err(RondaError::InvalidConfig(
                "neutral_score must be in [0, 100]".into(),
            ));
        }
        Ok(())
    }
}

/// One factor's part in a score change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorChange {
    /// Factor that moved.
    pub factor: Factor,
    /// Score on the earlier date, if it was scored.
    pub previous: Option<f64>,
    /// Score on the later date, if it was scored.
    pub current: Option<f64>,
    /// Current minus previous, missing sides taken as neutral.
    pub delta: f64,
    /// Applied weight.
    pub weight: f64,
    /// `delta * weight`, in composite points.
    pub contribution: f64,
    /// Readable description of the move.
    pub explanation: String,
}

/// Data availability for one expected factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorStatus {
    /// Factor.
    pub factor: Factor,
    /// Whether the factor was scored.
    pub available: bool,
    /// Scoring method, when scored.
    pub method: Option<ScoringMethod>,
    /// Sub-metrics that had no input.
    pub missing_metrics: Vec<Metric>,
    /// Why the factor is missing.
    pub reason: Option<String>,
}

/// Why a security's score moved between two runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    /// Security symbol.
    pub symbol: Symbol,
    /// Date of the explained score.
    pub as_of: Date,
    /// Date of the score it is compared with.
    pub previous_as_of: Option<Date>,
    /// Earlier stabilized score.
    pub previous_score: Option<f64>,
    /// Explained stabilized score.
    pub current_score: f64,
    /// Change in stabilized score, zero without a previous score.
    pub delta: f64,
    /// How the explained score was stabilized.
    pub transition: StabilizerTransition,
    /// Significant factor changes, largest contribution first.
    pub reasons: Vec<FactorChange>,
    /// One-line summary.
    pub summary: String,
    /// Confidence of the explained score.
    pub confidence: ConfidenceLevel,
    /// Completeness of the explained score.
    pub completeness: f64,
    /// Status of every expected factor.
    pub factors: Vec<FactorStatus>,
}

/// Builds [`ScoreExplanation`]s from persisted scores.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::{ExplainerConfig, ScoreExplainer};
///
/// let explainer = ScoreExplainer::new(ExplainerConfig::default());
/// if let Some(explanation) = explainer.explain_latest(store.as_ref(), "AAPL").await? {
///     println!("{}", explanation.summary);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoreExplainer {
    config: ExplainerConfig,
}

impl ScoreExplainer {
    /// Create an explainer. The configuration should already be validated.
    #[must_use]
    pub const fn new(config: ExplainerConfig) -> Self {
        Self { config }
    }

    /// Explain `current` against the score stored before it.
    ///
    /// Without a previous score there is nothing to attribute and no factor
    /// changes are reported.
    #[must_use]
    pub fn explain(
        &self,
        current: &CompositeScore,
        previous: Option<&CompositeScore>,
    ) -> ScoreExplanation {
        let delta = previous.map_or(0.0, |p| current.score - p.score);
        let reasons = previous
            .map(|p| self.factor_changes(current, p))
            .unwrap_or_default();

        ScoreExplanation {
            symbol: current.symbol.clone(),
            as_of: current.as_of,
            previous_as_of: previous.map(|p| p.as_of),
            previous_score: previous.map(|p| p.score),
            current_score: current.score,
            delta,
            transition: current.transition,
            summary: summarize(&current.symbol, delta, &reasons),
            reasons,
            confidence: current.confidence,
            completeness: current.completeness,
            factors: factor_statuses(current),
        }
    }

    /// Explain the latest stored score for `symbol`.
    ///
    /// Returns `None` when the symbol has never been scored.
    pub async fn explain_latest(
        &self,
        store: &dyn ScoreStore,
        symbol: &str,
    ) -> Result<Option<ScoreExplanation>> {
        let Some(current) = store.latest(symbol).await? else {
            return Ok(None);
        };
        let previous = store.previous_score(symbol, current.as_of).await?;
        tracing::debug!(
            symbol,
            as_of = %current.as_of,
            previous = ?previous.as_ref().map(|p| p.as_of),
            "explaining score"
        );
        Ok(Some(self.explain(&current, previous.as_ref())))
    }

    fn factor_changes(
        &self,
        current: &CompositeScore,
        previous: &CompositeScore,
    ) -> Vec<FactorChange> {
        let neutral = self.config.neutral_score;
        let mut changes: Vec<FactorChange> = Factor::ALL
            .into_iter()
            .filter_map(|factor| {
                let now = current.factor(factor).map(|s| s.value);
                let before = previous.factor(factor).map(|s| s.value);
                if now.is_none() && before.is_none() {
                    return None;
                }
                let delta = now.unwrap_or(neutral) - before.unwrap_or(neutral);
                if delta.abs() < self.config.significant_delta {
                    return None;
                }
                let weight = current
                    .weights
                    .get(&factor)
                    .or_else(|| previous.weights.get(&factor))
                    .copied()
                    .unwrap_or(0.0);
                Some(FactorChange {
                    factor,
                    previous: before,
                    current: now,
                    delta,
                    weight,
                    contribution: delta * weight,
                    explanation: describe(factor, delta).to_string(),
                })
            })
            .collect();

        changes.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        changes.truncate(self.config.max_reasons);
        changes
    }
}

fn factor_statuses(score: &CompositeScore) -> Vec<FactorStatus> {
    let pays_dividend = score
        .metadata
        .get("pays_dividend")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
        || score.factor(Factor::DividendQuality).is_some();

    CompletenessEstimator::expected(pays_dividend)
        .into_iter()
        .map(|factor| match score.factor(factor) {
            Some(scored) => FactorStatus {
                factor,
                available: true,
                method: Some(scored.method),
                missing_metrics: scored.missing.clone(),
                reason: None,
            },
            None => FactorStatus {
                factor,
                available: false,
                method: None,
                missing_metrics: Vec::new(),
                reason: Some(missing_reason(factor).to_string()),
            },
        })
        .collect()
}

fn summarize(symbol: &str, delta: f64, reasons: &[FactorChange]) -> String {
    let Some(top) = reasons.first() else {
        return if delta.abs() < 0.5 {
            format!("{symbol}'s score is unchanged")
        } else if delta > 0.0 {
            format!("{symbol}'s score improved slightly")
        } else {
            format!("{symbol}'s score declined slightly")
        };
    };

    let direction = if delta > 3.0 {
        "improved significantly"
    } else if delta > 0.0 {
        "improved"
    } else if delta < -3.0 {
        "declined significantly"
    } else {
        "declined"
    };
    format!(
        "{symbol}'s score {direction} ({delta:+.1} points), primarily due to {} ({:+.1})",
        top.factor.as_str().replace('_', " "),
        top.delta
    )
}

fn describe(factor: Factor, delta: f64) -> &'static str {
    let (up, down) = match factor {
        Factor::Value => (
            "Stock appears more undervalued vs sector peers",
            "Stock appears more overvalued vs sector peers",
        ),
        Factor::Growth => ("Revenue and earnings growth improved", "Growth metrics declined"),
        Factor::Profitability => (
            "Profitability margins improved",
            "Profitability margins contracted",
        ),
        Factor::FinancialHealth => (
            "Balance sheet strength improved",
            "Debt or liquidity metrics worsened",
        ),
        Factor::Momentum => ("Price momentum strengthened", "Price momentum weakened"),
        Factor::AnalystConsensus => ("Analyst ratings upgraded", "Analyst ratings downgraded"),
        Factor::InsiderActivity => ("Insider buying increased", "Insider selling increased"),
        Factor::InstitutionalOwnership => (
            "Institutional ownership increased",
            "Institutional ownership decreased",
        ),
        Factor::NewsSentiment => ("News sentiment improved", "News sentiment worsened"),
        Factor::Technical => (
            "Technical indicators turned bullish",
            "Technical indicators turned bearish",
        ),
        Factor::DividendQuality => (
            "Dividend yield or coverage improved",
            "Dividend sustainability weakened",
        ),
    };
    if delta > 0.0 { up } else { down }
}

fn missing_reason(factor: Factor) -> &'static str {
    match factor {
        Factor::Value => "Missing valuation data (P/E, P/B, P/S)",
        Factor::Growth => "Insufficient quarterly revenue and EPS history",
        Factor::Profitability => "Missing profitability metrics",
        Factor::FinancialHealth => "Missing balance sheet data",
        Factor::Momentum => "Missing price return data",
        Factor::AnalystConsensus => "No analyst coverage",
        Factor::InsiderActivity => "No insider trades reported",
        Factor::InstitutionalOwnership => "No institutional holdings data",
        Factor::NewsSentiment => "No recent news articles",
        Factor::Technical => "Missing technical indicators",
        Factor::DividendQuality => "Missing dividend history",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryScoreStore;
    use crate::store::testing::sample_score;
    use approx::assert_relative_eq;
    use ronda_traits::FactorScore;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn scored(factor: Factor, value: f64) -> FactorScore {
        FactorScore {
            factor,
            value,
            method: ScoringMethod::SectorRelative,
            components: Vec::new(),
            missing: Vec::new(),
        }
    }

    fn score_with(as_of: Date, score: f64, factors: &[(Factor, f64, f64)]) -> CompositeScore {
        let mut composite = sample_score("AAA", as_of, score);
        composite.factor_scores = factors.iter().map(|(f, v, _)| scored(*f, *v)).collect();
        composite.weights = factors.iter().map(|(f, _, w)| (*f, *w)).collect::<BTreeMap<_, _>>();
        composite.metadata = serde_json::json!({ "pays_dividend": false });
        composite
    }

    #[test]
    fn test_contributions_ranked_by_size() {
        let previous = score_with(
            date(2024, 2, 29),
            55.0,
            &[
                (Factor::Value, 60.0, 0.3),
                (Factor::Growth, 50.0, 0.2),
                (Factor::Momentum, 50.0, 0.5),
            ],
        );
        let current = score_with(
            date(2024, 3, 29),
            60.0,
            &[
                (Factor::Value, 70.0, 0.3),
                (Factor::Growth, 40.0, 0.2),
                (Factor::Momentum, 52.0, 0.5),
            ],
        );

        let explanation = ScoreExplainer::default().explain(&current, Some(&previous));
        assert_relative_eq!(explanation.delta, 5.0);
        assert_eq!(explanation.previous_as_of, Some(date(2024, 2, 29)));

        // Momentum moved less than the significance threshold
        assert_eq!(explanation.reasons.len(), 2);
        assert_eq!(explanation.reasons[0].factor, Factor::Value);
        assert_relative_eq!(explanation.reasons[0].contribution, 3.0);
        assert_eq!(explanation.reasons[1].factor, Factor::Growth);
        assert_relative_eq!(explanation.reasons[1].contribution, -2.0);
        assert_eq!(explanation.reasons[1].explanation, "Growth metrics declined");

        assert_eq!(
            explanation.summary,
            "AAA's score improved significantly (+5.0 points), primarily due to value (+10.0)"
        );
    }

    #[test]
    fn test_factor_missing_on_one_side_counts_as_neutral() {
        let previous = score_with(
            date(2024, 2, 29),
            58.0,
            &[(Factor::Value, 60.0, 0.6), (Factor::Technical, 70.0, 0.4)],
        );
        let current = score_with(date(2024, 3, 29), 57.0, &[(Factor::Value, 60.0, 1.0)]);

        let explanation = ScoreExplainer::default().explain(&current, Some(&previous));
        assert_eq!(explanation.reasons.len(), 1);
        let technical = &explanation.reasons[0];
        assert_eq!(technical.factor, Factor::Technical);
        assert_eq!(technical.current, None);
        assert_relative_eq!(technical.delta, -20.0);
        // Weight falls back to the earlier run
        assert_relative_eq!(technical.weight, 0.4);
        assert_eq!(
            explanation.summary,
            "AAA's score declined (-1.0 points), primarily due to technical (-20.0)"
        );

        let status = explanation
            .factors
            .iter()
            .find(|s| s.factor == Factor::Technical)
            .unwrap();
        assert!(!status.available);
        assert_eq!(status.reason.as_deref(), Some("Missing technical indicators"));
    }

    #[test]
    fn test_small_moves_summarized_without_reasons() {
        let previous = score_with(date(2024, 2, 29), 60.0, &[(Factor::Value, 60.0, 1.0)]);
        let explainer = ScoreExplainer::default();

        let current = score_with(date(2024, 3, 29), 61.0, &[(Factor::Value, 61.0, 1.0)]);
        let explanation = explainer.explain(&current, Some(&previous));
        assert!(explanation.reasons.is_empty());
        assert_eq!(explanation.summary, "AAA's score improved slightly");

        let current = score_with(date(2024, 3, 29), 60.2, &[(Factor::Value, 60.0, 1.0)]);
        let explanation = explainer.explain(&current, Some(&previous));
        assert_eq!(explanation.summary, "AAA's score is unchanged");
    }

    #[test]
    fn test_first_score_has_no_reasons() {
        let current = score_with(date(2024, 3, 29), 72.0, &[(Factor::Value, 90.0, 1.0)]);
        let explanation = ScoreExplainer::default().explain(&current, None);

        assert_eq!(explanation.previous_score, None);
        assert_relative_eq!(explanation.delta, 0.0);
        assert!(explanation.reasons.is_empty());
        assert_eq!(explanation.summary, "AAA's score is unchanged");
        assert_eq!(explanation.factors.len(), Factor::CORE.len());
    }

    #[test]
    fn test_reasons_truncated() {
        let factors: Vec<(Factor, f64, f64)> =
            Factor::CORE.iter().map(|f| (*f, 50.0, 0.1)).collect();
        let moved: Vec<(Factor, f64, f64)> =
            Factor::CORE.iter().map(|f| (*f, 80.0, 0.1)).collect();
        let previous = score_with(date(2024, 2, 29), 50.0, &factors);
        let current = score_with(date(2024, 3, 29), 80.0, &moved);

        let explainer = ScoreExplainer::new(ExplainerConfig {
            max_reasons: 3,
            ..Default::default()
        });
        assert_eq!(explainer.explain(&current, Some(&previous)).reasons.len(), 3);
    }

    #[test]
    fn test_dividend_payer_expects_dividend_quality() {
        let mut current = score_with(date(2024, 3, 29), 60.0, &[(Factor::Value, 60.0, 1.0)]);
        current.metadata = serde_json::json!({ "pays_dividend": true });

        let explanation = ScoreExplainer::default().explain(&current, None);
        assert_eq!(explanation.factors.len(), Factor::CORE.len() + 1);
        let dividend = explanation.factors.last().unwrap();
        assert_eq!(dividend.factor, Factor::DividendQuality);
        assert!(!dividend.available);

        let value = &explanation.factors[0];
        assert!(value.available);
        assert_eq!(value.method, Some(ScoringMethod::SectorRelative));
    }

    #[tokio::test]
    async fn test_explain_latest_uses_stored_history() {
        let store = MemoryScoreStore::new();
        let explainer = ScoreExplainer::default();
        assert!(explainer.explain_latest(&store, "AAA").await.unwrap().is_none());

        store
            .save(&score_with(date(2024, 1, 31), 40.0, &[(Factor::Growth, 30.0, 1.0)]))
            .await
            .unwrap();
        store
            .save(&score_with(date(2024, 2, 29), 45.0, &[(Factor::Growth, 45.0, 1.0)]))
            .await
            .unwrap();

        let explanation = explainer.explain_latest(&store, "AAA").await.unwrap().unwrap();
        assert_eq!(explanation.as_of, date(2024, 2, 29));
        assert_eq!(explanation.previous_as_of, Some(date(2024, 1, 31)));
        assert_relative_eq!(explanation.delta, 5.0);
        assert_eq!(explanation.reasons[0].factor, Factor::Growth);
        assert_eq!(
            explanation.reasons[0].explanation,
            "Revenue and earnings growth improved"
        );
    }
}
