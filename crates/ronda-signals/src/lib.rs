//! Factor calculators for the ronda composite scoring engine.
//!
//! This crate turns raw fundamental, market and ownership metrics into 0-100
//! factor scores:
//! - Normalize: sector percentile ranking with an absolute-benchmark fallback
//!   for small sectors
//! - Value, Growth, Quality: fundamentals
//! - Momentum: trailing returns and technical indicators
//! - Smart money: analysts, insiders and institutions
//! - Sentiment and dividend quality
//!
//! Every score is direction adjusted so that higher is better.
//!
//! # Example
//!
//! ```ignore
//! use ronda_signals::normalize::{NormalizerConfig, SectorStatistics};
//! use ronda_signals::registry::default_calculators;
//!
//! // Build sector statistics once per run
//! let stats = SectorStatistics::build(as_of, &snapshots, NormalizerConfig::default());
//!
//! // Score every factor for one security
//! for calc in default_calculators() {
//!     let score = calc.calculate(&snapshots[0], &stats);
//! }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod derive;
pub mod dividend;
pub mod factor;
pub mod growth;
pub mod momentum;
pub mod normalize;
pub mod quality;
pub mod registry;
pub mod sentiment;
pub mod smart_money;
pub mod value;

// Re-export key types
pub use derive::DerivationConfig;
pub use factor::weighted_factor;
pub use normalize::{DistributionTable, NormalizerConfig, SectorStatistics};
pub use registry::{CalculatorConfig, FactorCategory, FactorInfo, default_calculators};
