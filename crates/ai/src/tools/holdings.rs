//! Holdings tool - filtered, value-sorted holdings using rig-core Tool trait.

use folio_core::calculation::{market_value, unrealized_gain, unrealized_gain_pct, weight_of};
use folio_core::portfolio::{Holding, HoldingType};
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, to_decimal, to_f64};
use super::constants::{GET_HOLDINGS, MAX_HOLDINGS, SRC_LIST_HOLDINGS, SRC_MARKET_VALUE};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

// ============================================================================
// Tool Arguments and Output
// ============================================================================

/// Arguments for the get_holdings tool.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetHoldingsArgs {
    #[serde(default)]
    pub filter: Option<HoldingsFilter>,

    /// Maximum rows to return (1-100).
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HoldingsFilter {
    #[serde(default, rename = "type")]
    pub holding_type: Option<HoldingType>,

    /// Case-insensitive substring of the symbol.
    #[serde(default)]
    pub symbol: Option<String>,

    /// Minimum market value.
    #[serde(default)]
    pub min_value: Option<f64>,

    #[serde(default)]
    pub account_id: Option<String>,
}

impl ValidateArgs for GetHoldingsArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_HOLDINGS {
                return Err(format!("limit must be between 1 and {}", MAX_HOLDINGS));
            }
        }
        if let Some(min_value) = self.filter.as_ref().and_then(|f| f.min_value) {
            if !min_value.is_finite() || min_value < 0.0 {
                return Err("filter.minValue must be a non-negative number".to_string());
            }
        }
        Ok(())
    }
}

/// DTO for holding data in tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDto {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub holding_type: String,
    pub quantity: f64,
    pub price: f64,
    pub market_value: f64,
    pub cost_basis: Option<f64>,
    pub unrealized_gain: Option<f64>,
    pub unrealized_gain_pct: Option<f64>,
    /// Share of the reference total (0-1).
    pub portfolio_weight: f64,
    pub currency: String,
}

impl HoldingDto {
    pub fn from_holding(h: &Holding, reference_total: Decimal) -> Self {
        let value = market_value(h);
        Self {
            id: h.id.clone(),
            account_id: h.account_id.clone(),
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            holding_type: h.holding_type.to_string(),
            quantity: to_f64(h.quantity),
            price: to_f64(h.price),
            market_value: to_f64(value),
            cost_basis: h.cost_basis.and_then(|c| c.to_f64()),
            unrealized_gain: unrealized_gain(h).and_then(|g| g.to_f64()),
            unrealized_gain_pct: unrealized_gain_pct(h).and_then(|g| g.to_f64()),
            portfolio_weight: to_f64(weight_of(value, reference_total)),
            currency: h.currency.clone(),
        }
    }
}

/// Output envelope for holdings tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHoldingsOutput {
    pub holdings: Vec<HoldingDto>,
    pub total_value: f64,
    pub currency: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
}

// ============================================================================
// Tool Implementation
// ============================================================================

/// Tool to list holdings, largest first.
pub struct GetHoldingsTool<E: AiEnvironment> {
    env: Arc<E>,
    base_currency: String,
}

impl<E: AiEnvironment> GetHoldingsTool<E> {
    pub fn new(env: Arc<E>, base_currency: String) -> Self {
        Self { env, base_currency }
    }
}

impl<E: AiEnvironment> Clone for GetHoldingsTool<E> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            base_currency: self.base_currency.clone(),
        }
    }
}

fn matches_filter(h: &Holding, filter: &HoldingsFilter, min_value: Option<Decimal>) -> bool {
    if let Some(t) = filter.holding_type {
        if h.holding_type != t {
            return false;
        }
    }
    if let Some(symbol) = filter.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !h.symbol.to_lowercase().contains(&symbol.to_lowercase()) {
            return false;
        }
    }
    if let Some(account_id) = filter.account_id.as_deref().filter(|s| !s.is_empty()) {
        if h.account_id != account_id {
            return false;
        }
    }
    if let Some(min) = min_value {
        if market_value(h) < min {
            return false;
        }
    }
    true
}

impl<E: AiEnvironment + 'static> Tool for GetHoldingsTool<E> {
    const NAME: &'static str = GET_HOLDINGS;

    type Error = AiError;
    type Args = GetHoldingsArgs;
    type Output = Traced<GetHoldingsOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "List portfolio holdings sorted by market value, largest first. Optionally filter by holding type, symbol, account or minimum value. Each row includes quantity, price, market value, cost basis, unrealized gain and portfolioWeight (share of the returned rows).".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["stock", "etf", "fund", "bond", "crypto", "cash", "other"],
                                "description": "Only holdings of this type"
                            },
                            "symbol": {
                                "type": "string",
                                "description": "Case-insensitive symbol substring"
                            },
                            "minValue": {
                                "type": "number",
                                "minimum": 0,
                                "description": "Only holdings worth at least this much"
                            },
                            "accountId": {
                                "type": "string",
                                "description": "Only holdings in this account"
                            }
                        },
                        "additionalProperties": false
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_HOLDINGS,
                        "description": "Maximum rows to return"
                    }
                },
                "required": [],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let filter = args.filter.unwrap_or_default();
        let min_value = filter
            .min_value
            .map(|v| to_decimal("filter.minValue", v))
            .transpose()?;

        let holdings = self
            .env
            .portfolio_repository()
            .list_holdings()
            .map_err(core_err)?;

        let mut selected: Vec<Holding> = holdings
            .into_iter()
            .filter(|h| matches_filter(h, &filter, min_value))
            .collect();
        selected.sort_by(|a, b| {
            market_value(b)
                .cmp(&market_value(a))
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let original_count = selected.len();
        selected.truncate(args.limit.unwrap_or(MAX_HOLDINGS));
        let truncated = original_count > selected.len();

        let total: Decimal = selected.iter().map(market_value).sum();
        let rows: Vec<HoldingDto> = selected
            .iter()
            .map(|h| HoldingDto::from_holding(h, total))
            .collect();

        Ok(Traced::new(
            GetHoldingsOutput {
                count: rows.len(),
                holdings: rows,
                total_value: to_f64(total),
                currency: self.base_currency.clone(),
                truncated: truncated.then_some(true),
                original_count: truncated.then_some(original_count),
            },
            vec![SRC_LIST_HOLDINGS.to_string(), SRC_MARKET_VALUE.to_string()],
        ))
    }
}
