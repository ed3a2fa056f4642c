//! Holding detail tool - one position with its transactions, notes and alerts.

use chrono::{DateTime, Utc};
use folio_core::calculation::total_market_value;
use folio_core::portfolio::{Note, PriceAlert};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{
    core_err, push_unique, require_holding_ref, resolve_holding, sort_transactions_desc, to_f64,
    TransactionDto,
};
use super::constants::{
    DETAIL_RECENT_TRANSACTIONS, GET_HOLDING_DETAIL, SRC_LIST_HOLDINGS, SRC_LIST_NOTES,
    SRC_LIST_PRICE_ALERTS, SRC_LIST_TRANSACTIONS, SRC_MARKET_VALUE,
};
use super::holdings::HoldingDto;
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetHoldingDetailArgs {
    #[serde(default)]
    pub holding_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl ValidateArgs for GetHoldingDetailArgs {
    fn validate(&self) -> Result<(), String> {
        require_holding_ref(self.holding_id.as_deref(), self.symbol.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub id: String,
    pub holding_id: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteDto {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            holding_id: n.holding_id,
            content: n.content,
            tags: n.tags,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDto {
    pub id: String,
    pub holding_id: String,
    pub symbol: String,
    pub condition: String,
    pub target_price: f64,
    pub note: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PriceAlert> for AlertDto {
    fn from(a: PriceAlert) -> Self {
        Self {
            id: a.id,
            holding_id: a.holding_id,
            symbol: a.symbol,
            condition: serde_json::to_value(a.condition)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            target_price: to_f64(a.target_price),
            note: a.note,
            is_active: a.is_active,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDetailOutput {
    /// `portfolioWeight` is relative to the whole portfolio.
    pub holding: HoldingDto,
    pub recent_transactions: Vec<TransactionDto>,
    pub transaction_count: usize,
    pub notes: Vec<NoteDto>,
    pub active_alerts: Vec<AlertDto>,
}

pub struct GetHoldingDetailTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> GetHoldingDetailTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for GetHoldingDetailTool<E> {
    const NAME: &'static str = GET_HOLDING_DETAIL;

    type Error = AiError;
    type Args = GetHoldingDetailArgs;
    type Output = Traced<HoldingDetailOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get one holding in detail by holdingId or symbol: position figures, recent transactions, notes and active price alerts.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "holdingId": {
                        "type": "string",
                        "description": "Holding ID"
                    },
                    "symbol": {
                        "type": "string",
                        "description": "Ticker symbol, used when holdingId is not known"
                    }
                },
                "required": [],
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

        let all = repo.list_holdings().map_err(core_err)?;
        push_unique(&mut provenance, SRC_LIST_HOLDINGS);
        let total = total_market_value(&all);

        let mut transactions = repo.list_transactions(&holding.id).map_err(core_err)?;
        push_unique(&mut provenance, SRC_LIST_TRANSACTIONS);
        sort_transactions_desc(&mut transactions);

        let notes = repo.list_notes(Some(&holding.id)).map_err(core_err)?;
        push_unique(&mut provenance, SRC_LIST_NOTES);

        let alerts = repo
            .list_price_alerts(Some(&holding.id))
            .map_err(core_err)?;
        push_unique(&mut provenance, SRC_LIST_PRICE_ALERTS);
        push_unique(&mut provenance, SRC_MARKET_VALUE);

        Ok(Traced::new(
            HoldingDetailOutput {
                holding: HoldingDto::from_holding(&holding, total),
                transaction_count: transactions.len(),
                recent_transactions: transactions
                    .iter()
                    .take(DETAIL_RECENT_TRANSACTIONS)
                    .map(TransactionDto::from)
                    .collect(),
                notes: notes.into_iter().map(NoteDto::from).collect(),
                active_alerts: alerts
                    .into_iter()
                    .filter(|a| a.is_active)
                    .map(AlertDto::from)
                    .collect(),
            },
            provenance,
        ))
    }
}
