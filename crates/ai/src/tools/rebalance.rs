//! Rebalance suggestion tool - equal or custom target weights over non-cash
//! holdings. Suggestions only; nothing is persisted.

use folio_core::calculation::{market_value, weight_of};
use folio_core::portfolio::Holding;
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::common::{core_err, to_decimal, to_f64};
use super::constants::{
    DEFAULT_MIN_TRADE_VALUE, SRC_LIST_HOLDINGS, SRC_MARKET_VALUE, SRC_REBALANCE,
    SUGGEST_REBALANCE,
};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceMethod {
    Equal,
    Custom,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RebalancePolicy {
    pub method: RebalanceMethod,
    /// Holding id or symbol -> target weight (0-1). Custom method only.
    #[serde(default)]
    pub targets: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuggestRebalanceArgs {
    pub policy: RebalancePolicy,
    /// Trades smaller than this are reported as "hold".
    #[serde(default)]
    pub min_trade_value: Option<f64>,
}

impl ValidateArgs for SuggestRebalanceArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(min) = self.min_trade_value {
            if !min.is_finite() || min < 0.0 {
                return Err("minTradeValue must be a non-negative number".to_string());
            }
        }
        match (self.policy.method, &self.policy.targets) {
            (RebalanceMethod::Equal, Some(_)) => {
                Err("policy.targets is only allowed with the custom method".to_string())
            }
            (RebalanceMethod::Custom, None) => {
                Err("policy.targets is required for the custom method".to_string())
            }
            (RebalanceMethod::Custom, Some(targets)) => {
                if targets.is_empty() {
                    return Err("policy.targets must not be empty".to_string());
                }
                if let Some((key, _)) = targets
                    .iter()
                    .find(|(_, w)| !w.is_finite() || **w < 0.0 || **w > 1.0)
                {
                    return Err(format!("Target weight for {} must be between 0 and 1", key));
                }
                let sum: f64 = targets.values().sum();
                if sum > 1.0 + WEIGHT_TOLERANCE {
                    return Err(format!("Target weights sum to {:.4}, more than 1", sum));
                }
                Ok(())
            }
            (RebalanceMethod::Equal, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceTrade {
    pub holding_id: String,
    pub symbol: String,
    pub action: TradeAction,
    pub current_value: f64,
    pub target_value: f64,
    pub current_weight: f64,
    pub target_weight: f64,
    /// Positive to buy, negative to sell.
    pub delta_value: f64,
    pub delta_quantity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceSummary {
    pub total_buy: f64,
    pub total_sell: f64,
    pub total_value: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRebalanceOutput {
    pub method: RebalanceMethod,
    pub currency: String,
    pub min_trade_value: f64,
    pub trades: Vec<RebalanceTrade>,
    pub summary: RebalanceSummary,
    pub persisted: bool,
}

/// Resolve custom targets (keyed by id or symbol) to holding ids.
fn resolve_targets(
    universe: &[Holding],
    targets: &HashMap<String, f64>,
) -> Result<HashMap<String, Decimal>, AiError> {
    let mut resolved = HashMap::new();
    for (key, weight) in targets {
        let holding = universe
            .iter()
            .find(|h| h.id == *key)
            .or_else(|| universe.iter().find(|h| h.symbol.eq_ignore_ascii_case(key)))
            .ok_or_else(|| {
                AiError::tool(format!("Target {} does not match a non-cash holding", key))
            })?;
        if resolved
            .insert(holding.id.clone(), to_decimal("target weight", *weight)?)
            .is_some()
        {
            return Err(AiError::tool(format!(
                "Holding {} has more than one target",
                holding.symbol
            )));
        }
    }
    Ok(resolved)
}

pub struct SuggestRebalanceTool<E: AiEnvironment> {
    env: Arc<E>,
    base_currency: String,
}

impl<E: AiEnvironment> SuggestRebalanceTool<E> {
    pub fn new(env: Arc<E>, base_currency: String) -> Self {
        Self { env, base_currency }
    }
}

impl<E: AiEnvironment + 'static> Tool for SuggestRebalanceTool<E> {
    const NAME: &'static str = SUGGEST_REBALANCE;

    type Error = AiError;
    type Args = SuggestRebalanceArgs;
    type Output = Traced<SuggestRebalanceOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Suggest trades that move non-cash holdings toward target weights. Method 'equal' splits value evenly; method 'custom' takes targets keyed by holding id or symbol (weights 0-1, unlisted holdings target 0). Trades below minTradeValue are marked 'hold'. Nothing is executed.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "policy": {
                        "type": "object",
                        "properties": {
                            "method": { "type": "string", "enum": ["equal", "custom"] },
                            "targets": {
                                "type": "object",
                                "additionalProperties": { "type": "number", "minimum": 0, "maximum": 1 },
                                "description": "Holding id or symbol to target weight"
                            }
                        },
                        "required": ["method"],
                        "additionalProperties": false
                    },
                    "minTradeValue": {
                        "type": "number",
                        "minimum": 0,
                        "default": DEFAULT_MIN_TRADE_VALUE
                    }
                },
                "required": ["policy"],
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
        let universe: Vec<Holding> = holdings.into_iter().filter(|h| !h.is_cash()).collect();

        let min_trade_value = args.min_trade_value.unwrap_or(DEFAULT_MIN_TRADE_VALUE);
        let min_trade = to_decimal("minTradeValue", min_trade_value)?;
        let total: Decimal = universe.iter().map(market_value).sum();

        let custom = match (&args.policy.method, &args.policy.targets) {
            (RebalanceMethod::Custom, Some(targets)) => Some(resolve_targets(&universe, targets)?),
            _ => None,
        };
        let equal_weight = if universe.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::ONE / Decimal::from(universe.len())
        };

        let mut trades = Vec::with_capacity(universe.len());
        let mut total_buy = Decimal::ZERO;
        let mut total_sell = Decimal::ZERO;
        let mut trade_count = 0;

        for holding in &universe {
            let current = market_value(holding);
            let (target_weight, target_value) = match &custom {
                Some(targets) => {
                    let w = targets.get(&holding.id).copied().unwrap_or(Decimal::ZERO);
                    (w, total * w)
                }
                None => {
                    let n = Decimal::from(universe.len());
                    (equal_weight, total / n)
                }
            };
            let delta = target_value - current;

            let action = if delta.abs() < min_trade {
                TradeAction::Hold
            } else if delta > Decimal::ZERO {
                total_buy += delta;
                trade_count += 1;
                TradeAction::Buy
            } else {
                total_sell += -delta;
                trade_count += 1;
                TradeAction::Sell
            };

            trades.push(RebalanceTrade {
                holding_id: holding.id.clone(),
                symbol: holding.symbol.clone(),
                action,
                current_value: to_f64(current),
                target_value: to_f64(target_value),
                current_weight: to_f64(weight_of(current, total)),
                target_weight: to_f64(target_weight),
                delta_value: to_f64(delta),
                delta_quantity: (holding.price > Decimal::ZERO)
                    .then(|| to_f64(delta / holding.price)),
            });
        }

        Ok(Traced::new(
            SuggestRebalanceOutput {
                method: args.policy.method,
                currency: self.base_currency.clone(),
                min_trade_value,
                trades,
                summary: RebalanceSummary {
                    total_buy: to_f64(total_buy),
                    total_sell: to_f64(total_sell),
                    total_value: to_f64(total),
                    trade_count,
                },
                persisted: false,
            },
            vec![
                SRC_LIST_HOLDINGS.to_string(),
                SRC_MARKET_VALUE.to_string(),
                SRC_REBALANCE.to_string(),
            ],
        ))
    }
}
