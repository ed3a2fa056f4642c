//! Constants for tool names, provenance labels and bounded tool outputs.
//!
//! These limits ensure that tool outputs don't overwhelm the LLM context
//! while still providing enough data for meaningful analysis.

// Tool names
pub const GET_PORTFOLIO_SNAPSHOT: &str = "get_portfolio_snapshot";
pub const GET_HOLDINGS: &str = "get_holdings";
pub const GET_HOLDING_DETAIL: &str = "get_holding_detail";
pub const GET_HISTORY: &str = "get_history";
pub const SIMULATE_TRADE: &str = "simulate_trade";
pub const SUGGEST_REBALANCE: &str = "suggest_rebalance";
pub const ADD_NOTE: &str = "add_note";
pub const CREATE_PRICE_ALERT: &str = "create_price_alert";
pub const RUN_RESEARCH: &str = "run_research";
pub const SEARCH_RESEARCH: &str = "search_research";

// Provenance labels
pub const SRC_LIST_HOLDINGS: &str = "repository.list_holdings";
pub const SRC_GET_HOLDING: &str = "repository.get_holding";
pub const SRC_LIST_TRANSACTIONS: &str = "repository.list_transactions";
pub const SRC_LIST_PRICE_HISTORY: &str = "repository.list_price_history";
pub const SRC_LIST_NOTES: &str = "repository.list_notes";
pub const SRC_LIST_PRICE_ALERTS: &str = "repository.list_price_alerts";
pub const SRC_INSERT_NOTE: &str = "repository.insert_note";
pub const SRC_INSERT_PRICE_ALERT: &str = "repository.insert_price_alert";
pub const SRC_MARKET_VALUE: &str = "calculation.market_value";
pub const SRC_PORTFOLIO_SUMMARY: &str = "calculation.portfolio_summary";
pub const SRC_ALLOCATION: &str = "calculation.allocation_by_type";
pub const SRC_PRICE_CHANGE: &str = "calculation.price_change_pct";
pub const SRC_TRADE_SIMULATION: &str = "calculation.trade_simulation";
pub const SRC_REBALANCE: &str = "calculation.rebalance";
pub const SRC_LIST_REPORTS: &str = "research.list_reports";
pub const SRC_REQUEST_REPORT: &str = "research.request_report";

/// Maximum number of holdings returned per tool call.
pub const MAX_HOLDINGS: usize = 100;

/// Number of largest positions listed in the portfolio snapshot.
pub const SNAPSHOT_TOP_HOLDINGS: usize = 5;

/// Recent transactions included with a holding detail.
pub const DETAIL_RECENT_TRANSACTIONS: usize = 10;

/// Maximum number of price points returned per tool call.
pub const MAX_PRICE_POINTS: usize = 400;

/// Maximum number of transaction rows returned per tool call.
pub const MAX_TRANSACTIONS: usize = 200;

/// Default minimum trade value for rebalance suggestions.
pub const DEFAULT_MIN_TRADE_VALUE: f64 = 1.0;

/// Maximum note length in characters.
pub const MAX_NOTE_CHARS: usize = 4_000;

pub const DEFAULT_RESEARCH_RESULTS: usize = 5;
pub const MAX_RESEARCH_RESULTS: usize = 20;

/// Characters of context on each side of a research snippet match.
pub const SNIPPET_RADIUS_CHARS: usize = 80;
