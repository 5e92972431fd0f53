//! Quality factors based on profitability and balance-sheet strength.
//!
//! - Profitability: net and operating margins, return on equity and assets
//! - Financial health: leverage (debt/equity, interest coverage) and
//!   liquidity (current and quick ratios), weighted equally

mod health;
mod profitability;

pub use health::{FinancialHealthConfig, FinancialHealthFactor, credited_liquidity};
pub use profitability::{ProfitabilityConfig, ProfitabilityFactor};
