//! What-if trade simulation. Never writes to the repository.

use folio_core::calculation::{market_value, total_market_value, weight_of};
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, push_unique, require_holding_ref, resolve_holding, to_decimal, to_f64};
use super::constants::{SIMULATE_TRADE, SRC_LIST_HOLDINGS, SRC_MARKET_VALUE, SRC_TRADE_SIMULATION};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulateTradeArgs {
    #[serde(default)]
    pub holding_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub side: TradeSide,
    /// Units to trade. Exclusive with `amount`.
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Cash value to trade. Exclusive with `quantity`.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Execution price; defaults to the latest price.
    #[serde(default)]
    pub price: Option<f64>,
}

fn positive(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(format!("{} must be a positive number", field)),
        _ => Ok(()),
    }
}

impl ValidateArgs for SimulateTradeArgs {
    fn validate(&self) -> Result<(), String> {
        require_holding_ref(self.holding_id.as_deref(), self.symbol.as_deref())?;
        match (self.quantity, self.amount) {
            (Some(_), Some(_)) => return Err("Provide either quantity or amount, not both".to_string()),
            (None, None) => return Err("Provide quantity or amount".to_string()),
            _ => {}
        }
        positive("quantity", self.quantity)?;
        positive("amount", self.amount)?;
        positive("price", self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub quantity: f64,
    pub market_value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEffect {
    pub total_value_before: f64,
    pub total_value_after: f64,
    pub cash_before: f64,
    pub cash_after: f64,
    /// Cash missing to settle a buy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_shortfall: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTradeOutput {
    pub holding_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub trade_value: f64,
    pub before: PositionState,
    pub after: PositionState,
    pub portfolio: PortfolioEffect,
    /// Always false: simulations are never saved.
    pub persisted: bool,
}

pub struct SimulateTradeTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> SimulateTradeTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for SimulateTradeTool<E> {
    const NAME: &'static str = SIMULATE_TRADE;

    type Error = AiError;
    type Args = SimulateTradeArgs;
    type Output = Traced<SimulateTradeOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Simulate buying or selling a holding without saving anything. Give either quantity or amount. Returns the position and portfolio before and after the trade, settled against cash holdings.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "holdingId": { "type": "string" },
                    "symbol": { "type": "string" },
                    "side": { "type": "string", "enum": ["buy", "sell"] },
                    "quantity": { "type": "number", "exclusiveMinimum": 0 },
                    "amount": { "type": "number", "exclusiveMinimum": 0, "description": "Cash value to trade" },
                    "price": { "type": "number", "exclusiveMinimum": 0, "description": "Execution price, defaults to latest price" }
                },
                "required": ["side"],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let repo = self.env.portfolio_repository();
        let mut provenance = Vec::new();
        let holding = resolve_holding(
            repo.as_ref(),
            args.holding_id.as_deref(),
            args.symbol.as_deref(),
            &mut provenance,
        )?;
        // Cash settles the trade; it cannot also be the traded position.
        if holding.is_cash() {
            return Err(AiError::invalid_input(format!(
                "{} is a cash holding; simulate trades on securities only",
                holding.symbol
            )));
        }
        let all = repo.list_holdings().map_err(core_err)?;
        push_unique(&mut provenance, SRC_LIST_HOLDINGS);

        let price = match args.price {
            Some(p) => to_decimal("price", p)?,
            None => holding.price,
        };
        if price <= Decimal::ZERO {
            return Err(AiError::tool(format!(
                "No usable price for {}; pass price explicitly",
                holding.symbol
            )));
        }
        let quantity = match (args.quantity, args.amount) {
            (Some(q), _) => to_decimal("quantity", q)?,
            (None, Some(a)) => to_decimal("amount", a)? / price,
            (None, None) => return Err(AiError::invalid_input("Provide quantity or amount")),
        };
        if args.side == TradeSide::Sell && quantity > holding.quantity {
            return Err(AiError::tool(format!(
                "Cannot sell {} {}; only {} held",
                quantity.normalize(),
                holding.symbol,
                holding.quantity.normalize()
            )));
        }

        let trade_value = quantity * price;
        let total_before = total_market_value(&all);
        let cash_before = total_market_value(all.iter().filter(|h| h.is_cash()));
        let position_before = market_value(&holding);

        let (quantity_after, cash_after) = match args.side {
            TradeSide::Buy => (holding.quantity + quantity, cash_before - trade_value),
            TradeSide::Sell => (holding.quantity - quantity, cash_before + trade_value),
        };
        let position_after = quantity_after * holding.price;
        let total_after =
            total_before - cash_before + cash_after - position_before + position_after;

        provenance.push(SRC_MARKET_VALUE.to_string());
        provenance.push(SRC_TRADE_SIMULATION.to_string());

        Ok(Traced::new(
            SimulateTradeOutput {
                holding_id: holding.id.clone(),
                symbol: holding.symbol.clone(),
                side: args.side,
                quantity: to_f64(quantity),
                price: to_f64(price),
                trade_value: to_f64(trade_value),
                before: PositionState {
                    quantity: to_f64(holding.quantity),
                    market_value: to_f64(position_before),
                    weight: to_f64(weight_of(position_before, total_before)),
                },
                after: PositionState {
                    quantity: to_f64(quantity_after),
                    market_value: to_f64(position_after),
                    weight: to_f64(weight_of(position_after, total_after)),
                },
                portfolio: PortfolioEffect {
                    total_value_before: to_f64(total_before),
                    total_value_after: to_f64(total_after),
                    cash_before: to_f64(cash_before),
                    cash_after: to_f64(cash_after),
                    cash_shortfall: (cash_after < Decimal::ZERO).then(|| to_f64(-cash_after)),
                },
                persisted: false,
            },
            provenance,
        ))
    }
}
