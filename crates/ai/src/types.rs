//! Core types for AI orchestration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use rig::completion::ToolDefinition;

use crate::error::AiError;

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Features and Providers
// ============================================================================

/// Call-site purpose of a request. Selects the model and tool eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiFeature {
    /// Conversational assistant. The only feature allowed to call tools.
    Chat,
    Summary,
    Insights,
    /// Deep research. Eligible for vendor live search.
    Research,
    /// Background planning. Never cached unless a TTL is given explicitly.
    Planning,
}

impl AiFeature {
    pub const ALL: [AiFeature; 5] = [
        AiFeature::Chat,
        AiFeature::Summary,
        AiFeature::Insights,
        AiFeature::Research,
        AiFeature::Planning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiFeature::Chat => "chat",
            AiFeature::Summary => "summary",
            AiFeature::Insights => "insights",
            AiFeature::Research => "research",
            AiFeature::Planning => "planning",
        }
    }

    pub fn is_tool_eligible(&self) -> bool {
        matches!(self, AiFeature::Chat)
    }
}

impl fmt::Display for AiFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported vendors. Adding a variant forces every dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiProvider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "xai")]
    Xai,
}

impl AiProvider {
    pub const ALL: [AiProvider; 3] = [AiProvider::OpenAi, AiProvider::Anthropic, AiProvider::Xai];

    /// Catalog and settings identifier.
    pub fn id(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Xai => "xai",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AiProvider {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "anthropic" => Ok(AiProvider::Anthropic),
            "xai" | "grok" => Ok(AiProvider::Xai),
            _ => Err(AiError::ProviderNotSupported(s.to_string())),
        }
    }
}

// ============================================================================
// Usage
// ============================================================================

/// Token counts normalized across vendors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Receives incremental text as it arrives.
pub type TokenCallback = Arc<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// Orchestrator request / response
// ============================================================================

/// A feature-scoped conversational request.
#[derive(Clone)]
pub struct AiRequest {
    pub feature: AiFeature,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub cancel: CancellationToken,
    pub on_token: Option<TokenCallback>,
    /// Per-call TTL override in seconds. Zero disables caching.
    pub cache_ttl_secs: Option<u64>,
    pub force_refresh: bool,
    /// UI label for the call. Not part of the cache key.
    pub label: Option<String>,
}

impl AiRequest {
    pub fn new(feature: AiFeature, messages: Vec<Message>) -> Self {
        Self {
            feature,
            system: None,
            messages,
            stream: false,
            cancel: CancellationToken::new(),
            on_token: None,
            cache_ttl_secs: None,
            force_refresh: false,
            label: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_stream(mut self, on_token: TokenCallback) -> Self {
        self.stream = true;
        self.on_token = Some(on_token);
        self
    }

    pub fn with_token_callback(mut self, on_token: TokenCallback) -> Self {
        self.on_token = Some(on_token);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl_secs = Some(ttl_secs);
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Debug for AiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiRequest")
            .field("feature", &self.feature)
            .field("messages", &self.messages.len())
            .field("stream", &self.stream)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("force_refresh", &self.force_refresh)
            .field("label", &self.label)
            .finish()
    }
}

/// Successful outcome of `AiOrchestrator::call_ai`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub text: String,
    pub provider: AiProvider,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub from_cache: bool,
    pub tools_used: Vec<String>,
    pub cache_key: String,
    pub estimated_cost_usd: f64,
    pub duration_ms: u64,
}

// ============================================================================
// Provider request / response
// ============================================================================

/// Canonical request handed to a provider adapter.
#[derive(Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub feature: AiFeature,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    /// Tool declarations. Empty when the feature is not tool-eligible.
    pub tools: Vec<ToolDefinition>,
    pub stream: bool,
    pub cancel: CancellationToken,
    pub on_token: Option<TokenCallback>,
    pub use_proxy: bool,
    pub web_search: bool,
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, feature: AiFeature, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            feature,
            system: None,
            messages,
            tools: Vec::new(),
            stream: false,
            cancel: CancellationToken::new(),
            on_token: None,
            use_proxy: false,
            web_search: false,
        }
    }

    /// Emit text through the token callback, if any.
    pub fn emit(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(on_token) = &self.on_token {
            on_token(text);
        }
    }

    /// Whether responses should be streamed for rounds without tools.
    pub fn wants_stream(&self) -> bool {
        self.stream && self.on_token.is_some()
    }
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRequest")
            .field("model", &self.model)
            .field("feature", &self.feature)
            .field("messages", &self.messages.len())
            .field("tools", &self.tools.len())
            .field("stream", &self.stream)
            .field("use_proxy", &self.use_proxy)
            .field("web_search", &self.web_search)
            .finish()
    }
}

/// Normalized result of one provider exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    /// Last raw vendor body, kept for diagnostics.
    #[serde(default)]
    pub raw: Value,
    #[serde(default)]
    pub tools_used: Vec<String>,
}
