//! Price-based factors.
//!
//! - Momentum: trailing 1, 3, 6 and 12 month returns
//! - Technical: RSI, MACD histogram and price relative to the 50-day SMA
//!
//! Both are ranked within sector, so a 10% quarter in a sector that rallied
//! 20% is below-median momentum.

mod returns;
mod technical;

pub use returns::{MomentumConfig, MomentumFactor};
pub use technical::{TechnicalConfig, TechnicalFactor};
