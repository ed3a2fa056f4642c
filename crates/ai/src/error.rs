//! AI orchestration error types.

use folio_core::Error as CoreError;
use serde_json::Value;
use thiserror::Error;

/// AI orchestration errors.
///
/// Every failure a caller can observe from `AiOrchestrator::call_ai` is one of
/// these variants; [`AiError::code`] gives the stable machine-readable code.
#[derive(Debug, Error)]
pub enum AiError {
    /// Invalid input or request.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing API key for a provider.
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    /// No active provider in settings.
    #[error("No AI provider is configured")]
    ProviderMissing,

    /// Active provider id does not name a supported vendor.
    #[error("AI provider '{0}' is not supported")]
    ProviderNotSupported(String),

    /// No model mapped for the requested feature.
    #[error("No model configured for feature '{feature}' on provider {provider}")]
    ModelMissing { provider: String, feature: String },

    /// Monthly spend ceiling reached.
    #[error("Monthly AI budget exceeded: ${usage:.2} of ${budget:.2} used")]
    BudgetExceeded { usage: f64, budget: f64 },

    /// Non-2xx response from a vendor.
    #[error("{provider} request failed with HTTP {status}: {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Bounded tool loop ran out of rounds without a final answer.
    #[error("{provider} did not return a final answer within {rounds} rounds")]
    ToolLoop {
        provider: String,
        rounds: usize,
        last_response: Value,
    },

    /// Transport failure or any other error surfaced at the call site.
    #[error("Request failed: {0}")]
    Client(String),

    /// Call cancelled by the caller.
    #[error("Request aborted")]
    Aborted,

    /// Tool execution failed.
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// Core error from folio-core.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AiError {
    /// Create a new invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new tool execution error.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecutionFailed(msg.into())
    }

    /// Create a new client error.
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            AiError::InvalidInput(_) => "invalid_input",
            AiError::MissingApiKey(_) => "missing_api_key",
            AiError::ProviderMissing => "provider_missing",
            AiError::ProviderNotSupported(_) => "provider_not_supported",
            AiError::ModelMissing { .. } => "model_missing",
            AiError::BudgetExceeded { .. } => "budget_exceeded",
            AiError::Http { .. } => "http_error",
            AiError::ToolLoop { .. } => "tool_loop",
            AiError::Client(_) => "client_error",
            AiError::Aborted => "aborted",
            AiError::ToolExecutionFailed(_) => "tool_execution_failed",
            AiError::Core(_) => "core_error",
            AiError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status carried by `http_error`.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider the error originated from, when known.
    pub fn provider(&self) -> Option<&str> {
        match self {
            AiError::MissingApiKey(provider) => Some(provider),
            AiError::ModelMissing { provider, .. }
            | AiError::Http { provider, .. }
            | AiError::ToolLoop { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Vendor details (`http_error`) or the last raw response (`tool_loop`).
    pub fn details(&self) -> Option<&Value> {
        match self {
            AiError::Http { details, .. } => details.as_ref(),
            AiError::ToolLoop { last_response, .. } => Some(last_response),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, AiError::Aborted)
    }
}
