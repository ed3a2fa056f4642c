//! Bounded, append-only record of orchestration attempts.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AiError;
use crate::repository::AiRepositoryTrait;
use crate::types::{AiFeature, TokenUsage};

/// Provider recorded when none could be resolved.
pub const UNAVAILABLE_PROVIDER: &str = "unavailable";

/// Maximum characters kept from an error summary.
pub const MAX_LOG_MESSAGE_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub feature: AiFeature,
    pub model: Option<String>,
    pub cache_hit: bool,
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost_usd: f64,
    pub duration_ms: u64,
    pub cache_key: Option<String>,
}

impl CallLogEntry {
    pub fn new(feature: AiFeature, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp,
            provider: UNAVAILABLE_PROVIDER.to_string(),
            feature,
            model: None,
            cache_hit: false,
            ok: false,
            error_code: None,
            message: None,
            prompt_tokens: 0,
            completion_tokens: 0,
            estimated_cost_usd: 0.0,
            duration_ms: 0,
            cache_key: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<&TokenUsage>) -> Self {
        if let Some(usage) = usage {
            self.prompt_tokens = usage.prompt_tokens;
            self.completion_tokens = usage.completion_tokens;
        }
        self
    }

    pub fn with_error(mut self, error: &AiError) -> Self {
        self.ok = false;
        self.error_code = Some(error.code().to_string());
        self.message = Some(error.to_string());
        self
    }
}

pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[derive(Clone)]
pub struct CallLog {
    repo: Arc<dyn AiRepositoryTrait>,
}

impl CallLog {
    pub fn new(repo: Arc<dyn AiRepositoryTrait>) -> Self {
        Self { repo }
    }

    /// Append an entry. Storage failures are logged and dropped.
    pub async fn append(&self, mut entry: CallLogEntry) {
        entry.message = entry
            .message
            .map(|m| truncate_message(&m, MAX_LOG_MESSAGE_CHARS));
        if let Err(e) = self.repo.append_call_log(entry).await {
            warn!("Failed to append AI call log entry: {}", e);
        }
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<CallLogEntry>, AiError> {
        self.repo.list_call_logs(limit)
    }
}
