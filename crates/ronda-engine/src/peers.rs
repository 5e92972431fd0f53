//! Same-sector peer similarity.
//!
//! Peers are a read-only view for display; they never feed the composite.

use std::cmp::Ordering;

use ronda_traits::stats::year_over_year_growth;
use ronda_traits::{MetricSnapshot, Result, RondaError, Symbol};
use serde::{Deserialize, Serialize};

/// Configuration for peer search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Number of peers to return (default: 5)
    pub count: usize,

    /// Weight of the market-cap ratio term (default: 0.4)
    pub cap_weight: f64,

    /// Weight of the P/E ratio term (default: 0.3)
    pub valuation_weight: f64,

    /// Weight of the revenue growth difference (default: 0.3)
    pub growth_weight: f64,

    /// Growth difference, in percentage points, that counts as one unit (default: 50)
    pub growth_scale: f64,

    /// Contribution of a term that cannot be computed (default: 1.0)
    pub missing_term_penalty: f64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            count: 5,
            cap_weight: 0.4,
            valuation_weight: 0.3,
            growth_weight: 0.3,
            growth_scale: 50.0,
            missing_term_penalty: 1.0,
        }
    }
}

impl PeerConfig {
    /// Check weights and scale.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.cap_weight, self.valuation_weight, self.growth_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RondaError::InvalidConfig(
                "peer weights must be finite and non-negative".into(),
            ));
        }
        if self.growth_scale <= 0.0 || self.missing_term_penalty < 0.0 {
            return Err(RondaError::InvalidConfig(
                "peer growth_scale must be positive and missing_term_penalty non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// One similar company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer symbol.
    pub symbol: Symbol,
    /// Weighted distance to the target; smaller is more similar.
    pub distance: f64,
    /// `max / min` of the two market caps, if both are positive.
    pub cap_ratio: Option<f64>,
    /// Peer market cap.
    pub market_cap: Option<f64>,
    /// Peer P/E.
    pub pe_ratio: Option<f64>,
    /// Peer year-over-year revenue growth (%).
    pub revenue_growth: Option<f64>,
}

/// `max / min` for two positive values.
fn spread_ratio(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let (a, b) = (a.filter(|v| *v > 0.0)?, b.filter(|v| *v > 0.0)?);
    let ratio = a.max(b) / a.min(b);
    ratio.is_finite().then_some(ratio)
}

/// Finds the most similar same-sector companies.
///
/// Distance is
/// `w_cap * (cap_ratio - 1) + w_val * (pe_ratio - 1) + w_growth * |Δg| / scale`,
/// where each ratio is `max / min` of the two values. A term whose inputs are
/// missing or non-positive contributes the fixed missing-term penalty.
///
/// # Example
///
/// ```ignore
/// use ronda_engine::peers::PeerSimilarityEngine;
///
/// let engine = PeerSimilarityEngine::default();
/// for peer in engine.find_peers(&target, &universe) {
///     println!("{} {:.3}", peer.symbol, peer.distance);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeerSimilarityEngine {
    config: PeerConfig,
}

impl PeerSimilarityEngine {
    /// Create a peer engine.
    #[must_use]
    pub const fn new(config: PeerConfig) -> Self {
        Self { config }
    }

    /// Distance between two companies and their market-cap ratio.
    #[must_use]
    pub fn distance(&self, a: &MetricSnapshot, b: &MetricSnapshot) -> (f64, Option<f64>) {
        let c = &self.config;
        let penalty = c.missing_term_penalty;

        let cap_ratio = spread_ratio(a.market_cap, b.market_cap);
        let cap_term = cap_ratio.map_or(penalty, |r| r - 1.0);

        let pe_term = spread_ratio(a.pe_ratio, b.pe_ratio).map_or(penalty, |r| r - 1.0);

        let growth_term = match (
            year_over_year_growth(&a.revenue_quarters),
            year_over_year_growth(&b.revenue_quarters),
        ) {
            (Some(ga), Some(gb)) => (ga - gb).abs() / c.growth_scale,
            _ => penalty,
        };

        let distance =
            c.cap_weight * cap_term + c.valuation_weight * pe_term + c.growth_weight * growth_term;
        (distance, cap_ratio)
    }

    /// Top peers of `target` within `universe`.
    ///
    /// Only active securities of the same sector are considered and the
    /// target itself is excluded. Results are sorted by ascending distance,
    /// ties broken by market-cap ratio and then symbol.
    #[must_use]
    pub fn find_peers(&self, target: &MetricSnapshot, universe: &[MetricSnapshot]) -> Vec<Peer> {
        let mut peers: Vec<Peer> = universe
            .iter()
            .filter(|s| {
                s.security.active && s.sector() == target.sector() && s.symbol() != target.symbol()
            })
            .map(|s| {
                let (distance, cap_ratio) = self.distance(target, s);
                Peer {
                    symbol: s.symbol().to_string(),
                    distance,
                    cap_ratio,
                    market_cap: s.market_cap,
                    pe_ratio: s.pe_ratio,
                    revenue_growth: year_over_year_growth(&s.revenue_quarters),
                }
            })
            .filter(|p| p.distance.is_finite())
            .collect();

        peers.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| match (a.cap_ratio, b.cap_ratio) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        peers.truncate(self.config.count);
        peers
    }
}
