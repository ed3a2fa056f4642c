//! AI provider catalog and settings management.
//!
//! This module provides:
//! - Provider catalog loaded from JSON configuration (endpoints, secret key
//!   names, recommended models, pricing)
//! - `AiSettings`, the runtime configuration stored by the settings service
//! - API key management via the environment's secret store

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cache::DEFAULT_CACHE_TTL_SECS;
use crate::env::AiEnvironment;
use crate::error::AiError;
use crate::pricing::price_for_model;
use crate::types::{AiFeature, AiProvider};

// ============================================================================
// Provider Catalog (Static JSON)
// ============================================================================

/// Static provider catalog loaded from embedded JSON.
pub(crate) static PROVIDER_CATALOG: Lazy<ProviderCatalog> = Lazy::new(|| {
    let json = include_str!("ai_providers.json");
    serde_json::from_str(json).expect("Failed to parse ai_providers.json")
});

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderCatalog {
    pub providers: HashMap<String, ProviderCatalogEntry>,
    pub pricing: PricingCatalog,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderCatalogEntry {
    pub name: String,
    pub env_key: String,
    pub base_url: String,
    pub proxy_path: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub recommended_models: HashMap<AiFeature, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PricingCatalog {
    pub tiers: Vec<PriceTier>,
    pub fallback: ModelPrice,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceTier {
    pub prefix: String,
    #[serde(flatten)]
    pub price: ModelPrice,
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

fn catalog_entry(provider: AiProvider) -> Result<&'static ProviderCatalogEntry, AiError> {
    PROVIDER_CATALOG
        .providers
        .get(provider.id())
        .ok_or_else(|| AiError::Internal(format!("Provider {} missing from catalog", provider)))
}

/// Recommended models per feature, most preferred first.
pub type RecommendedModels = HashMap<AiFeature, Vec<String>>;

/// Provider info for catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub documentation_url: Option<String>,
    pub has_api_key: bool,
    /// First recommended chat model.
    pub default_model: Option<String>,
    pub recommended_models: RecommendedModels,
    /// Price of every recommended model.
    pub model_prices: BTreeMap<String, ModelPrice>,
}

// ============================================================================
// Stored Settings
// ============================================================================

/// Settings key for the AI configuration document.
pub const AI_SETTINGS_KEY: &str = "ai_settings";

/// AI settings stored as JSON in app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    /// Active provider id ("openai", "anthropic", "xai").
    pub provider_id: Option<String>,
    /// Provider id -> feature -> model id.
    pub models: HashMap<String, HashMap<AiFeature, String>>,
    /// Route requests through the same-origin proxy, which injects the key.
    pub use_proxy: bool,
    pub proxy_base_url: Option<String>,
    /// Provider id -> base URL override.
    pub provider_urls: HashMap<String, String>,
    /// Monthly spend ceiling. Zero disables the gate.
    pub monthly_budget_usd: f64,
    pub logging_enabled: bool,
    pub streaming_enabled: bool,
    pub web_search: bool,
    pub cache_ttl_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider_id: None,
            models: HashMap::new(),
            use_proxy: false,
            proxy_base_url: None,
            provider_urls: HashMap::new(),
            monthly_budget_usd: 0.0,
            logging_enabled: true,
            streaming_enabled: true,
            web_search: false,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl AiSettings {
    /// Model mapped for a feature on a provider. Blank entries count as unmapped.
    pub fn model_for(&self, provider: AiProvider, feature: AiFeature) -> Option<&str> {
        self.models
            .get(provider.id())
            .and_then(|m| m.get(&feature))
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
    }

    pub fn set_model(&mut self, provider: AiProvider, feature: AiFeature, model: impl Into<String>) {
        self.models
            .entry(provider.id().to_string())
            .or_default()
            .insert(feature, model.into());
    }
}

// ============================================================================
// Provider Service
// ============================================================================

/// Provider service for managing AI settings, endpoints and keys.
pub struct ProviderService<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> Clone for ProviderService<E> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
        }
    }
}

impl<E: AiEnvironment> ProviderService<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }

    /// List every catalog provider, in `AiProvider::ALL` order, with its key
    /// status and model prices.
    pub fn get_provider_catalog(&self) -> Vec<ProviderInfo> {
        AiProvider::ALL
            .iter()
            .filter_map(|p| catalog_entry(*p).ok().map(|entry| (*p, entry)))
            .map(|(provider, entry)| ProviderInfo {
                id: provider.id().to_string(),
                name: entry.name.clone(),
                base_url: entry.base_url.clone(),
                documentation_url: entry.documentation_url.clone(),
                has_api_key: self.has_api_key(provider),
                default_model: entry
                    .recommended_models
                    .get(&AiFeature::Chat)
                    .and_then(|models| models.first())
                    .cloned(),
                recommended_models: entry.recommended_models.clone(),
                model_prices: entry
                    .recommended_models
                    .values()
                    .flatten()
                    .map(|model| (model.clone(), price_for_model(model)))
                    .collect(),
            })
            .collect()
    }

    /// Load the stored settings. A missing or unreadable document yields defaults.
    pub fn get_settings(&self) -> Result<AiSettings, AiError> {
        let stored = self
            .env
            .settings_service()
            .get_setting_value(AI_SETTINGS_KEY)?;

        Ok(stored
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring unreadable AI settings: {}", e);
                    None
                }
            })
            .unwrap_or_default())
    }

    pub async fn update_settings(&self, settings: &AiSettings) -> Result<AiSettings, AiError> {
        let json = serde_json::to_string(settings).map_err(|e| AiError::Internal(e.to_string()))?;
        self.env
            .settings_service()
            .set_setting_value(AI_SETTINGS_KEY, &json)
            .await?;
        self.get_settings()
    }

    /// Make `provider` active, seeding unmapped features with its first
    /// recommended model.
    pub async fn select_provider(&self, provider: AiProvider) -> Result<AiSettings, AiError> {
        let mut settings = self.get_settings()?;
        settings.provider_id = Some(provider.id().to_string());
        for (feature, models) in self.recommended_models(provider)? {
            if settings.model_for(provider, feature).is_none() {
                if let Some(model) = models.first() {
                    settings.set_model(provider, feature, model.clone());
                }
            }
        }
        self.update_settings(&settings).await
    }

    pub fn recommended_models(&self, provider: AiProvider) -> Result<RecommendedModels, AiError> {
        Ok(catalog_entry(provider)?.recommended_models.clone())
    }

    /// Get API key for a provider from the secret store. Blank keys count as absent.
    pub fn get_api_key(&self, provider: AiProvider) -> Result<Option<String>, AiError> {
        let env_key = &catalog_entry(provider)?.env_key;
        let key = self.env.secret_store().get_secret(env_key)?;
        Ok(key.filter(|k| !k.trim().is_empty()))
    }

    pub fn has_api_key(&self, provider: AiProvider) -> bool {
        matches!(self.get_api_key(provider), Ok(Some(_)))
    }

    pub async fn set_api_key(&self, provider: AiProvider, api_key: &str) -> Result<(), AiError> {
        let env_key = &catalog_entry(provider)?.env_key;
        self.env
            .secret_store()
            .set_secret(env_key, api_key)
            .map_err(AiError::from)
    }

    pub async fn delete_api_key(&self, provider: AiProvider) -> Result<(), AiError> {
        let env_key = &catalog_entry(provider)?.env_key;
        self.env
            .secret_store()
            .delete_secret(env_key)
            .map_err(AiError::from)
    }

    /// Vendor base URL: settings override, else the catalog default.
    pub fn base_url(&self, provider: AiProvider, settings: &AiSettings) -> Result<String, AiError> {
        if let Some(url) = settings
            .provider_urls
            .get(provider.id())
            .filter(|u| !u.trim().is_empty())
        {
            return Ok(url.trim_end_matches('/').to_string());
        }
        Ok(catalog_entry(provider)?.base_url.clone())
    }

    /// Same-origin proxy URL, when a proxy base URL is configured.
    pub fn proxy_url(&self, provider: AiProvider, settings: &AiSettings) -> Option<String> {
        let base = settings
            .proxy_base_url
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())?;
        let entry = catalog_entry(provider).ok()?;
        Some(format!("{}{}", base.trim_end_matches('/'), entry.proxy_path))
    }
}
