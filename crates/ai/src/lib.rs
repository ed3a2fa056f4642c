//! Folio AI - multi-provider AI orchestration.
//!
//! This crate dispatches feature-scoped requests to OpenAI, Anthropic or xAI,
//! lets the model call a fixed catalog of portfolio tools through a bounded
//! loop, and layers caching, a monthly budget and a call log around every call.
//!
//! # Architecture
//!
//! - `orchestrator`: `AiOrchestrator::call_ai`, the single public entry point
//! - `adapters`: one adapter per vendor over a shared bounded tool loop
//! - `tools`: tool registry and the ten portfolio tools
//! - `cache`: content-addressed response cache with per-entry TTL
//! - `ledger`: monthly USD usage and budget gate
//! - `pricing`: per-model-family cost estimation
//! - `call_log`: bounded record of every attempt
//! - `providers`: provider catalog, settings document and API keys
//! - `repository`: persistence boundary for cache, log and ledger state
//! - `env`: environment abstraction for collaborators
//!
//! # Example
//!
//! ```ignore
//! use folio_ai::{AiFeature, AiOrchestrator, AiRequest, Message};
//!
//! // The embedding application implements AiEnvironment.
//! let orchestrator = AiOrchestrator::new(Arc::new(env));
//!
//! let response = orchestrator
//!     .call_ai(AiRequest::new(
//!         AiFeature::Chat,
//!         vec![Message::user("How concentrated is my portfolio?")],
//!     ))
//!     .await?;
//! println!("{} (from cache: {})", response.text, response.from_cache);
//! ```

pub mod adapters;
pub mod cache;
pub mod call_log;
pub mod env;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod pricing;
pub mod providers;
pub mod repository;
pub mod tools;
pub mod types;

pub use adapters::{
    adapter_for, AdapterContext, AnthropicAdapter, OpenAiAdapter, ProviderAdapter, XaiAdapter,
    MAX_TOOL_ROUNDS,
};
pub use cache::{compute_cache_key, CacheEntry, CacheStore, CachedValue, DEFAULT_CACHE_TTL_SECS};
pub use call_log::{CallLog, CallLogEntry, MAX_LOG_MESSAGE_CHARS, UNAVAILABLE_PROVIDER};
pub use env::AiEnvironment;
pub use error::AiError;
pub use ledger::{month_key, UsageLedger};
pub use orchestrator::{AiOrchestrator, UsageSummary};
pub use pricing::{estimate_cost, price_for_model};
pub use providers::{
    AiSettings, ModelPrice, ProviderInfo, ProviderService, RecommendedModels, AI_SETTINGS_KEY,
};
pub use repository::{AiRepositoryTrait, InMemoryAiRepository, MAX_CALL_LOG_ENTRIES};
pub use tools::{
    RawToolArgs, ToolExecutionResult, ToolExecutor, ToolInvocation, ToolRegistry, ToolSet,
};
pub use types::{
    AiFeature, AiProvider, AiRequest, AiResponse, Message, MessageRole, ProviderRequest,
    ProviderResponse, TokenCallback, TokenUsage,
};
