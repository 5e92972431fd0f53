//! Composite combination for ronda.
//!
//! This crate turns a security's factor scores into a raw composite:
//! - Lifecycle: classify the company as hypergrowth, growth, mature, value
//!   or turnaround
//! - Profiles: per-stage slot weights, with the smart money meta-factor split
//!   by fixed internal proportions
//! - Allocator: redistribute the weight of missing factors so applied weights
//!   always sum to one
//! - Combiner: weighted sum on the 0-100 scale
//! - Completeness: share of expected factors scored and its confidence band
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::collections::BTreeSet;
//!
//! use ronda_combine::{Combiner, LifecycleClassifier, WeightAllocator, WeightedSumCombiner};
//! use ronda_combine::lifecycle::LifecycleInputs;
//! use ronda_traits::{Factor, FactorScore};
//!
//! let scores: Vec<FactorScore> = vec![/* from the factor calculators */];
//! let stage = LifecycleClassifier::default().classify(&LifecycleInputs::default()).stage;
//!
//! let available: BTreeSet<Factor> = scores.iter().map(|s| s.factor).collect();
//! let weights = WeightAllocator::default().allocate(stage, &available).unwrap();
//! let composite = WeightedSumCombiner.combine(&scores, &weights).unwrap();
//! ```

pub mod allocator;
mod combiner;
pub mod completeness;
pub mod lifecycle;
pub mod profile;

// Re-export main types
pub use allocator::{AppliedWeights, WeightAllocator};
pub use combiner::{Combiner, WeightedSumCombiner};
pub use completeness::{Completeness, CompletenessConfig, CompletenessEstimator};
pub use lifecycle::{Classification, LifecycleClassifier, LifecycleThresholds};
pub use profile::{SmartMoneyMix, WeightConfig, WeightProfile};
