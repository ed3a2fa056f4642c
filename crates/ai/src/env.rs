//! Environment abstraction for AI orchestration.
//!
//! This module provides the `AiEnvironment` trait that abstracts runtime
//! dependencies like the portfolio repository, secret store, settings and the
//! orchestration repository. The embedding application implements this trait
//! with its own service instances.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::{
    portfolio::PortfolioRepositoryTrait, research::ResearchServiceTrait, secrets::SecretStore,
    settings::SettingsServiceTrait,
};

use crate::repository::AiRepositoryTrait;

/// Environment abstraction for the AI subsystem.
///
/// Implementations provide access to:
/// - Portfolio repository for holdings, history, notes and alerts
/// - Research service for stored reports and report generation
/// - Settings service holding the AI settings document
/// - Secret store for API keys
/// - AI repository for cache, call log and usage ledger state
#[async_trait]
pub trait AiEnvironment: Send + Sync {
    /// Get the user's base currency (e.g., "USD", "EUR").
    fn base_currency(&self) -> String;

    fn portfolio_repository(&self) -> Arc<dyn PortfolioRepositoryTrait>;

    fn research_service(&self) -> Arc<dyn ResearchServiceTrait>;

    /// Get the settings service for reading AI settings.
    fn settings_service(&self) -> Arc<dyn SettingsServiceTrait>;

    /// Get the secret store for API keys.
    fn secret_store(&self) -> Arc<dyn SecretStore>;

    fn ai_repository(&self) -> Arc<dyn AiRepositoryTrait>;
}
