//! Persistence boundary for the cache, call log and usage ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use crate::cache::CacheEntry;
use crate::call_log::CallLogEntry;
use crate::error::AiError;

/// Maximum number of call log entries kept by [`InMemoryAiRepository`].
pub const MAX_CALL_LOG_ENTRIES: usize = 200;

/// Result type for AI repository operations.
pub type AiRepositoryResult<T> = Result<T, AiError>;

/// Repository for orchestration state.
///
/// Last write wins; implementations need no cross-call locking.
#[async_trait]
pub trait AiRepositoryTrait: Send + Sync {
    // Cache
    fn get_cache_entry(&self, key: &str) -> AiRepositoryResult<Option<CacheEntry>>;
    async fn put_cache_entry(&self, entry: CacheEntry) -> AiRepositoryResult<()>;
    /// Remove entries expired at `now`, returning how many were removed.
    async fn purge_expired_cache(&self, now: DateTime<Utc>) -> AiRepositoryResult<usize>;

    // Call log
    async fn append_call_log(&self, entry: CallLogEntry) -> AiRepositoryResult<()>;
    /// Most recent entries first.
    fn list_call_logs(&self, limit: usize) -> AiRepositoryResult<Vec<CallLogEntry>>;

    // Usage ledger
    fn get_usage(&self, month: &str) -> AiRepositoryResult<f64>;
    /// Add to a month's running total, returning the new total.
    async fn add_usage(&self, month: &str, amount: f64) -> AiRepositoryResult<f64>;
}

fn poisoned<T>(_: PoisonError<T>) -> AiError {
    AiError::Internal("AI repository lock poisoned".to_string())
}

/// In-process repository backed by lock-guarded maps.
pub struct InMemoryAiRepository {
    cache: RwLock<HashMap<String, CacheEntry>>,
    call_logs: RwLock<VecDeque<CallLogEntry>>,
    usage: RwLock<HashMap<String, f64>>,
    max_log_entries: usize,
}

impl Default for InMemoryAiRepository {
    fn default() -> Self {
        Self::with_log_capacity(MAX_CALL_LOG_ENTRIES)
    }
}

impl InMemoryAiRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_capacity(max_log_entries: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            call_logs: RwLock::new(VecDeque::new()),
            usage: RwLock::new(HashMap::new()),
            max_log_entries: max_log_entries.max(1),
        }
    }

    pub fn cache_len(&self) -> AiRepositoryResult<usize> {
        Ok(self.cache.read().map_err(poisoned)?.len())
    }
}

#[async_trait]
impl AiRepositoryTrait for InMemoryAiRepository {
    fn get_cache_entry(&self, key: &str) -> AiRepositoryResult<Option<CacheEntry>> {
        Ok(self.cache.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn put_cache_entry(&self, entry: CacheEntry) -> AiRepositoryResult<()> {
        self.cache
            .write()
            .map_err(poisoned)?
            .insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn purge_expired_cache(&self, now: DateTime<Utc>) -> AiRepositoryResult<usize> {
        let mut cache = self.cache.write().map_err(poisoned)?;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now));
        Ok(before - cache.len())
    }

    async fn append_call_log(&self, entry: CallLogEntry) -> AiRepositoryResult<()> {
        let mut logs = self.call_logs.write().map_err(poisoned)?;
        logs.push_back(entry);
        while logs.len() > self.max_log_entries {
            logs.pop_front();
        }
        Ok(())
    }

    fn list_call_logs(&self, limit: usize) -> AiRepositoryResult<Vec<CallLogEntry>> {
        let logs = self.call_logs.read().map_err(poisoned)?;
        Ok(logs.iter().rev().take(limit).cloned().collect())
    }

    fn get_usage(&self, month: &str) -> AiRepositoryResult<f64> {
        Ok(self
            .usage
            .read()
            .map_err(poisoned)?
            .get(month)
            .copied()
            .unwrap_or(0.0))
    }

    async fn add_usage(&self, month: &str, amount: f64) -> AiRepositoryResult<f64> {
        let mut usage = self.usage.write().map_err(poisoned)?;
        let total = usage.entry(month.to_string()).or_insert(0.0);
        *total += amount;
        Ok(*total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_log::CallLogEntry;
    use crate::types::AiFeature;

    #[tokio::test]
    async fn test_call_log_is_bounded() {
        let repo = InMemoryAiRepository::with_log_capacity(3);
        for i in 0..5 {
            let mut entry = CallLogEntry::new(AiFeature::Chat, Utc::now());
            entry.message = Some(format!("call {}", i));
            repo.append_call_log(entry).await.unwrap();
        }

        let logs = repo.list_call_logs(10).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message.as_deref(), Some("call 4"));
        assert_eq!(logs[2].message.as_deref(), Some("call 2"));
    }

    #[tokio::test]
    async fn test_usage_accumulates_per_month() {
        let repo = InMemoryAiRepository::new();
        assert_eq!(repo.get_usage("2025-01").unwrap(), 0.0);
        repo.add_usage("2025-01", 1.5).await.unwrap();
        let total = repo.add_usage("2025-01", 2.0).await.unwrap();
        assert_eq!(total, 3.5);
        assert_eq!(repo.get_usage("2025-02").unwrap(), 0.0);
    }
}
