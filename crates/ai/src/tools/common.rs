//! Helpers shared by the portfolio tools.

use chrono::{DateTime, Utc};
use folio_core::portfolio::{Holding, PortfolioRepositoryTrait, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::constants::{SRC_GET_HOLDING, SRC_LIST_HOLDINGS};
use crate::error::AiError;

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub(crate) fn to_decimal(field: &str, value: f64) -> Result<Decimal, AiError> {
    Decimal::try_from(value)
        .map_err(|_| AiError::invalid_input(format!("{} is not a representable number", field)))
}

pub(crate) fn core_err(e: folio_core::Error) -> AiError {
    AiError::ToolExecutionFailed(e.to_string())
}

/// Either `holdingId` or `symbol` must identify the holding.
pub(crate) fn require_holding_ref(
    holding_id: Option<&str>,
    symbol: Option<&str>,
) -> Result<(), String> {
    let present = |v: Option<&str>| v.map(|s| !s.trim().is_empty()).unwrap_or(false);
    if present(holding_id) || present(symbol) {
        Ok(())
    } else {
        Err("Provide either holdingId or symbol".to_string())
    }
}

/// Find a holding by id, falling back to a case-insensitive symbol match.
/// Pushes the repository calls used onto `provenance`.
pub(crate) fn resolve_holding(
    repo: &dyn PortfolioRepositoryTrait,
    holding_id: Option<&str>,
    symbol: Option<&str>,
    provenance: &mut Vec<String>,
) -> Result<Holding, AiError> {
    if let Some(id) = holding_id.map(str::trim).filter(|s| !s.is_empty()) {
        provenance.push(SRC_GET_HOLDING.to_string());
        return repo
            .get_holding(id)
            .map_err(core_err)?
            .ok_or_else(|| AiError::tool(format!("Holding not found: {}", id)));
    }

    let symbol = symbol
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AiError::invalid_input("Provide either holdingId or symbol"))?;
    provenance.push(SRC_LIST_HOLDINGS.to_string());
    repo.list_holdings()
        .map_err(core_err)?
        .into_iter()
        .find(|h| h.symbol.eq_ignore_ascii_case(symbol))
        .ok_or_else(|| AiError::tool(format!("No holding with symbol {}", symbol)))
}

pub(crate) fn push_unique(provenance: &mut Vec<String>, source: &str) {
    if !provenance.iter().any(|p| p == source) {
        provenance.push(source.to_string());
    }
}

/// DTO for transaction rows in tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub kind: String,
    pub date: DateTime<Utc>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub fee: f64,
    pub note: Option<String>,
}

impl From<&Transaction> for TransactionDto {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            kind: serde_json::to_value(t.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            date: t.date,
            quantity: to_f64(t.quantity),
            unit_price: to_f64(t.unit_price),
            amount: to_f64(t.amount()),
            fee: to_f64(t.fee),
            note: t.note.clone(),
        }
    }
}

/// Newest first.
pub(crate) fn sort_transactions_desc(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
}
