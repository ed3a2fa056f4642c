//! Content-addressed response cache with per-entry TTL and lazy expiry.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::repository::AiRepositoryTrait;
use crate::types::{AiFeature, AiProvider, Message, ProviderResponse};

/// Default TTL for non-streaming responses, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Computes the stable cache key for a request.
///
/// The key is a SHA-256 hash over exactly these fields:
/// - provider id
/// - model
/// - feature
/// - system prompt (absent and empty hash differently)
/// - every message role and content, in order
///
/// Streaming flags, cancellation tokens, callbacks and labels are excluded so
/// semantically identical requests always collide. Each field is length
/// prefixed, so no content can be crafted to shift a field boundary.
pub fn compute_cache_key(
    provider: AiProvider,
    model: &str,
    feature: AiFeature,
    system: Option<&str>,
    messages: &[Message],
) -> String {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, provider.id());
    update_field(&mut hasher, model);
    update_field(&mut hasher, feature.as_str());

    match system {
        Some(system) => {
            hasher.update([1u8]);
            update_field(&mut hasher, system);
        }
        None => hasher.update([0u8]),
    }

    hasher.update((messages.len() as u64).to_be_bytes());
    for message in messages {
        update_field(&mut hasher, message.role.as_str());
        update_field(&mut hasher, &message.content);
    }

    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

/// A cached provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedValue {
    pub response: ProviderResponse,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub value: CachedValue,
    pub feature: AiFeature,
    pub model: String,
    pub provider: AiProvider,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn new(
        key: String,
        response: ProviderResponse,
        feature: AiFeature,
        provider: AiProvider,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            model: response.model.clone(),
            value: CachedValue {
                response,
                cached_at: now,
            },
            feature,
            provider,
            ttl_secs,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.value.cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Cache store over the AI repository.
///
/// Storage failures never fail a call: reads degrade to a miss and writes are
/// dropped with a warning.
#[derive(Clone)]
pub struct CacheStore {
    repo: Arc<dyn AiRepositoryTrait>,
}

impl CacheStore {
    pub fn new(repo: Arc<dyn AiRepositoryTrait>) -> Self {
        Self { repo }
    }

    /// Live entry for `key`. Expired entries are treated as absent.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        match self.repo.get_cache_entry(key) {
            Ok(Some(entry)) if !entry.is_expired(now) => Some(entry),
            Ok(_) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    pub async fn put(&self, entry: CacheEntry) {
        let key = entry.key.clone();
        if let Err(e) = self.repo.put_cache_entry(entry).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        match self.repo.purge_expired_cache(now).await {
            Ok(removed) => {
                if removed > 0 {
                    debug!("Purged {} expired cache entries", removed);
                }
                removed
            }
            Err(e) => {
                warn!("Cache purge failed: {}", e);
                0
            }
        }
    }
}
