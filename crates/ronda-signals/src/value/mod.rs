//! Value factor based on valuation multiples.
//!
//! Every multiple is ranked within the security's sector rather than against
//! fixed thresholds, so a 25x P/E in software and a 25x P/E in utilities are
//! judged against different peers:
//! - Price-to-earnings: positive earnings only
//! - Price-to-book and price-to-sales
//! - PEG: P/E divided by EPS growth, only when both are positive
//!
//! All four are lower-is-better.

mod multiples;

pub use multiples::{ValueConfig, ValueFactor};
