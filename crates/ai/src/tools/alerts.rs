//! Price alert tool.

use chrono::Utc;
use folio_core::calculation::price_change_pct;
use folio_core::portfolio::{AlertCondition, NewPriceAlert};
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, require_holding_ref, resolve_holding, to_decimal, to_f64};
use super::constants::{CREATE_PRICE_ALERT, SRC_INSERT_PRICE_ALERT};
use super::holding_detail::AlertDto;
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePriceAlertArgs {
    #[serde(default)]
    pub holding_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub condition: AlertCondition,
    pub target_price: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl ValidateArgs for CreatePriceAlertArgs {
    fn validate(&self) -> Result<(), String> {
        require_holding_ref(self.holding_id.as_deref(), self.symbol.as_deref())?;
        if !self.target_price.is_finite() || self.target_price <= 0.0 {
            return Err("targetPrice must be a positive number".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriceAlertOutput {
    pub alert: AlertDto,
    pub current_price: f64,
    /// Move from the current price to the target, as a fraction.
    pub distance_pct: Option<f64>,
    /// The condition already holds at the current price.
    pub already_triggered: bool,
}

pub struct CreatePriceAlertTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> CreatePriceAlertTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for CreatePriceAlertTool<E> {
    const NAME: &'static str = CREATE_PRICE_ALERT;

    type Error = AiError;
    type Args = CreatePriceAlertArgs;
    type Output = Traced<CreatePriceAlertOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Create a price alert that fires when a holding's price goes above or below a target price.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "holdingId": { "type": "string" },
                    "symbol": { "type": "string" },
                    "condition": { "type": "string", "enum": ["above", "below"] },
                    "targetPrice": { "type": "number", "exclusiveMinimum": 0 },
                    "note": { "type": "string" }
                },
                "required": ["condition", "targetPrice"],
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
        let target = to_decimal("targetPrice", args.target_price)?;

        let alert = repo
            .insert_price_alert(NewPriceAlert {
                holding_id: holding.id.clone(),
                symbol: holding.symbol.clone(),
                condition: args.condition,
                target_price: target,
                note: args.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                created_at: Utc::now(),
            })
            .await
            .map_err(core_err)?;
        provenance.push(SRC_INSERT_PRICE_ALERT.to_string());

        let already_triggered = match args.condition {
            AlertCondition::Above => holding.price >= target,
            AlertCondition::Below => holding.price <= target,
        };

        Ok(Traced::new(
            CreatePriceAlertOutput {
                alert: AlertDto::from(alert),
                current_price: to_f64(holding.price),
                distance_pct: price_change_pct(holding.price, target).and_then(|d| d.to_f64()),
                already_triggered,
            },
            provenance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_env::{holding, MockEnvironment};
    use folio_core::portfolio::HoldingType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_alert() {
        let env = Arc::new(MockEnvironment::new().with_holdings(vec![holding(
            "h1",
            "AMZN",
            HoldingType::Stock,
            dec!(2),
            dec!(200),
        )]));
        let tool = CreatePriceAlertTool::new(env.clone());

        let output = tool
            .call(CreatePriceAlertArgs {
                holding_id: Some("h1".to_string()),
                symbol: None,
                condition: AlertCondition::Above,
                target_price: 250.0,
                note: None,
            })
            .await
            .unwrap();

        let data = output.data;
        assert_eq!(data.alert.condition, "above");
        assert_eq!(data.alert.target_price, 250.0);
        assert!(data.alert.is_active);
        assert_eq!(data.distance_pct, Some(0.25));
        assert!(!data.already_triggered);
        assert_eq!(
            output.data_provenance,
            vec!["repository.get_holding", "repository.insert_price_alert"]
        );
        assert_eq!(env.portfolio.alerts.read().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_bad_target() {
        let args: CreatePriceAlertArgs = serde_json::from_value(serde_json::json!({
            "symbol": "AMZN", "condition": "below", "targetPrice": 0
        }))
        .unwrap();
        assert!(args.validate().is_err());

        let bad_condition = serde_json::from_value::<CreatePriceAlertArgs>(serde_json::json!({
            "symbol": "AMZN", "condition": "crosses", "targetPrice": 10
        }));
        assert!(bad_condition.is_err());
    }
}
