//! Monthly USD usage ledger and budget gate.

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use crate::error::AiError;
use crate::repository::AiRepositoryTrait;

/// Calendar-month key, e.g. "2025-03".
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Running spend per calendar month. Only ever increases.
#[derive(Clone)]
pub struct UsageLedger {
    repo: Arc<dyn AiRepositoryTrait>,
}

impl UsageLedger {
    pub fn new(repo: Arc<dyn AiRepositoryTrait>) -> Self {
        Self { repo }
    }

    pub fn current_usage(&self, now: DateTime<Utc>) -> Result<f64, AiError> {
        self.repo.get_usage(&month_key(now))
    }

    /// Add a billed cost, returning the month total. Negative or non-finite
    /// amounts are ignored.
    pub async fn record(&self, cost_usd: f64, now: DateTime<Utc>) -> Result<f64, AiError> {
        let month = month_key(now);
        if !cost_usd.is_finite() || cost_usd <= 0.0 {
            return self.repo.get_usage(&month);
        }
        let total = self.repo.add_usage(&month, cost_usd).await?;
        debug!("AI usage for {} is now ${:.6}", month, total);
        Ok(total)
    }

    /// Reject when a positive budget is configured and already reached.
    /// Returns the current usage otherwise.
    pub fn check_budget(&self, budget_usd: f64, now: DateTime<Utc>) -> Result<f64, AiError> {
        let usage = self.current_usage(now)?;
        if budget_usd > 0.0 && usage >= budget_usd {
            return Err(AiError::BudgetExceeded {
                usage,
                budget: budget_usd,
            });
        }
        Ok(usage)
    }
}
