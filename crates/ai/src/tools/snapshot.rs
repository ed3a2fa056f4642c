//! Portfolio snapshot tool - totals, allocation and top positions.

use chrono::{DateTime, Utc};
use folio_core::calculation::{allocation_by_type, market_value, portfolio_summary, weight_of};
use folio_core::portfolio::Holding;
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, to_f64};
use super::constants::{
    GET_PORTFOLIO_SNAPSHOT, MAX_HOLDINGS, SNAPSHOT_TOP_HOLDINGS, SRC_ALLOCATION,
    SRC_LIST_HOLDINGS, SRC_MARKET_VALUE, SRC_PORTFOLIO_SUMMARY,
};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetPortfolioSnapshotArgs {
    /// Number of largest positions to list.
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl ValidateArgs for GetPortfolioSnapshotArgs {
    fn validate(&self) -> Result<(), String> {
        match self.top_n {
            Some(n) if n == 0 || n > MAX_HOLDINGS => {
                Err(format!("topN must be between 1 and {}", MAX_HOLDINGS))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDto {
    pub holding_type: String,
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHoldingDto {
    pub id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub market_value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshotOutput {
    pub currency: String,
    pub total_value: f64,
    pub invested_value: f64,
    pub cash_value: f64,
    pub total_cost: f64,
    pub unrealized_gain: f64,
    pub unrealized_gain_pct: Option<f64>,
    pub holdings_count: usize,
    pub allocation: Vec<AllocationDto>,
    pub top_holdings: Vec<TopHoldingDto>,
    pub as_of: DateTime<Utc>,
}

/// Tool to summarize the whole portfolio.
pub struct GetPortfolioSnapshotTool<E: AiEnvironment> {
    env: Arc<E>,
    base_currency: String,
}

impl<E: AiEnvironment> GetPortfolioSnapshotTool<E> {
    pub fn new(env: Arc<E>, base_currency: String) -> Self {
        Self { env, base_currency }
    }
}

impl<E: AiEnvironment + 'static> Tool for GetPortfolioSnapshotTool<E> {
    const NAME: &'static str = GET_PORTFOLIO_SNAPSHOT;

    type Error = AiError;
    type Args = GetPortfolioSnapshotArgs;
    type Output = Traced<PortfolioSnapshotOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get a snapshot of the whole portfolio: total, invested and cash value, cost, unrealized gain, allocation by holding type, and the largest positions. Use this first for questions like 'how is my portfolio doing?'.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "topN": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_HOLDINGS,
                        "description": "Number of largest positions to include",
                        "default": SNAPSHOT_TOP_HOLDINGS
                    }
                },
                "required": [],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let holdings = self
            .env
            .portfolio_repository()
            .list_holdings()
            .map_err(core_err)?;

        let summary = portfolio_summary(&holdings);
        let allocation = allocation_by_type(&holdings)
            .into_iter()
            .map(|slice| AllocationDto {
                holding_type: slice.holding_type.to_string(),
                value: to_f64(slice.value),
                weight: to_f64(slice.weight),
            })
            .collect();

        let mut ranked: Vec<&Holding> = holdings.iter().collect();
        ranked.sort_by(|a, b| market_value(b).cmp(&market_value(a)));
        let top_holdings = ranked
            .into_iter()
            .take(args.top_n.unwrap_or(SNAPSHOT_TOP_HOLDINGS))
            .map(|h| {
                let value = market_value(h);
                TopHoldingDto {
                    id: h.id.clone(),
                    symbol: h.symbol.clone(),
                    name: h.name.clone(),
                    market_value: to_f64(value),
                    weight: to_f64(weight_of(value, summary.total_value)),
                }
            })
            .collect();

        Ok(Traced::new(
            PortfolioSnapshotOutput {
                currency: self.base_currency.clone(),
                total_value: to_f64(summary.total_value),
                invested_value: to_f64(summary.invested_value),
                cash_value: to_f64(summary.cash_value),
                total_cost: to_f64(summary.total_cost),
                unrealized_gain: to_f64(summary.unrealized_gain),
                unrealized_gain_pct: summary.unrealized_gain_pct.and_then(|p| p.to_f64()),
                holdings_count: summary.holdings_count,
                allocation,
                top_holdings,
                as_of: Utc::now(),
            },
            vec![
                SRC_LIST_HOLDINGS.to_string(),
                SRC_PORTFOLIO_SUMMARY.to_string(),
                SRC_ALLOCATION.to_string(),
                SRC_MARKET_VALUE.to_string(),
            ],
        ))
    }
}
