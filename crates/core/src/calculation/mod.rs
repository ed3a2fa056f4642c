//! Calculation library - pure valuation functions over holdings.

mod valuation;

pub use valuation::{
    allocation_by_type, market_value, portfolio_summary, price_change_pct, total_market_value,
    unrealized_gain, unrealized_gain_pct, weight_of, AllocationSlice, PortfolioSummary,
};
