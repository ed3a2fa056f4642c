//! History tool - prices and transactions over a relative range.

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use folio_core::calculation::price_change_pct;
use rig::{completion::ToolDefinition, tool::Tool};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{
    core_err, require_holding_ref, resolve_holding, sort_transactions_desc, to_f64, TransactionDto,
};
use super::constants::{
    GET_HISTORY, MAX_PRICE_POINTS, MAX_TRANSACTIONS, SRC_LIST_PRICE_HISTORY,
    SRC_LIST_TRANSACTIONS, SRC_PRICE_CHANGE,
};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

/// Relative lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1w")]
    OneWeek,
    #[default]
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "all")]
    All,
}

impl HistoryRange {
    /// First included date, or None for the full history.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            HistoryRange::OneWeek => today.checked_sub_days(Days::new(7)),
            HistoryRange::OneMonth => today.checked_sub_months(Months::new(1)),
            HistoryRange::ThreeMonths => today.checked_sub_months(Months::new(3)),
            HistoryRange::SixMonths => today.checked_sub_months(Months::new(6)),
            HistoryRange::OneYear => today.checked_sub_months(Months::new(12)),
            HistoryRange::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            HistoryRange::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Prices,
    Transactions,
    #[default]
    Both,
}

impl HistoryKind {
    fn includes_prices(&self) -> bool {
        matches!(self, HistoryKind::Prices | HistoryKind::Both)
    }

    fn includes_transactions(&self) -> bool {
        matches!(self, HistoryKind::Transactions | HistoryKind::Both)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetHistoryArgs {
    #[serde(default)]
    pub holding_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub range: HistoryRange,
    #[serde(default)]
    pub kind: HistoryKind,
}

impl ValidateArgs for GetHistoryArgs {
    fn validate(&self) -> Result<(), String> {
        require_holding_ref(self.holding_id.as_deref(), self.symbol.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePointDto {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOutput {
    pub holding_id: String,
    pub symbol: String,
    pub range: HistoryRange,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<PricePointDto>>,
    /// Change between the first and last close in range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

pub struct GetHistoryTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> GetHistoryTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for GetHistoryTool<E> {
    const NAME: &'static str = GET_HISTORY;

    type Error = AiError;
    type Args = GetHistoryArgs;
    type Output = Traced<HistoryOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get price history and/or transactions for one holding over a relative range (1w, 1m, 3m, 6m, 1y, ytd, all). Price history includes the percentage change across the range.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "holdingId": { "type": "string", "description": "Holding ID" },
                    "symbol": { "type": "string", "description": "Ticker symbol, used when holdingId is not known" },
                    "range": {
                        "type": "string",
                        "enum": ["1w", "1m", "3m", "6m", "1y", "ytd", "all"],
                        "default": "1m"
                    },
                    "kind": {
                        "type": "string",
                        "enum": ["prices", "transactions", "both"],
                        "default": "both"
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

        let today = Utc::now().date_naive();
        let start = args.range.start_date(today);
        let in_range = |date: NaiveDate| start.map_or(true, |s| date >= s);
        let mut truncated = false;

        let (prices, change_pct) = if args.kind.includes_prices() {
            let mut points: Vec<_> = repo
                .list_price_history(&holding.id)
                .map_err(core_err)?
                .into_iter()
                .filter(|p| in_range(p.date))
                .collect();
            provenance.push(SRC_LIST_PRICE_HISTORY.to_string());
            points.sort_by_key(|p| p.date);

            let change = match (points.first(), points.last()) {
                (Some(first), Some(last)) if points.len() > 1 => {
                    provenance.push(SRC_PRICE_CHANGE.to_string());
                    price_change_pct(first.close, last.close).and_then(|c| c.to_f64())
                }
                _ => None,
            };

            if points.len() > MAX_PRICE_POINTS {
                truncated = true;
                points.drain(..points.len() - MAX_PRICE_POINTS);
            }
            let dtos = points
                .iter()
                .map(|p| PricePointDto {
                    date: p.date,
                    close: to_f64(p.close),
                })
                .collect();
            (Some(dtos), change)
        } else {
            (None, None)
        };

        let transactions = if args.kind.includes_transactions() {
            let mut rows: Vec<_> = repo
                .list_transactions(&holding.id)
                .map_err(core_err)?
                .into_iter()
                .filter(|t| in_range(t.date.date_naive()))
                .collect();
            provenance.push(SRC_LIST_TRANSACTIONS.to_string());
            sort_transactions_desc(&mut rows);
            if rows.len() > MAX_TRANSACTIONS {
                truncated = true;
                rows.truncate(MAX_TRANSACTIONS);
            }
            Some(rows.iter().map(TransactionDto::from).collect())
        } else {
            None
        };

        Ok(Traced::new(
            HistoryOutput {
                holding_id: holding.id,
                symbol: holding.symbol,
                range: args.range,
                start_date: start,
                end_date: today,
                prices,
                change_pct,
                transactions,
                truncated: truncated.then_some(true),
            },
            provenance,
        ))
    }
}
