//! Provider adapters: one canonical request/response contract over three
//! vendor wire dialects.
//!
//! - `anthropic`: Messages API (content blocks, `tool_use` / `tool_result`)
//! - `openai`: Chat Completions, shared with xAI (plus xAI live search)
//! - `tool_loop`: the bounded tool-calling loop every adapter runs
//! - `http`: cancellable POST helpers and vendor error extraction
//! - `sse`: server-sent-event line decoding for streamed rounds

mod anthropic;
mod http;
mod openai;
mod sse;
mod tool_loop;

pub use anthropic::AnthropicAdapter;
pub use openai::{OpenAiAdapter, XaiAdapter};
pub use tool_loop::{MAX_TOOL_ROUNDS, TOOLS_UNAVAILABLE_MESSAGE};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AiError;
use crate::providers::RecommendedModels;
use crate::tools::ToolExecutor;
use crate::types::{AiProvider, ProviderRequest, ProviderResponse};

/// One vendor behind the canonical contract.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> AiProvider;

    /// Recommended model ids per feature, from the provider catalog.
    fn recommended_models(&self) -> RecommendedModels;

    /// Run one request, including the bounded tool loop.
    ///
    /// Never touches cache, ledger or call log.
    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, AiError>;
}

/// Everything an adapter needs besides the request itself.
#[derive(Clone)]
pub struct AdapterContext {
    pub http: reqwest::Client,
    pub api_key: Option<String>,
    /// Vendor base URL, without trailing slash.
    pub base_url: String,
    /// Same-origin proxy URL for this provider, when configured.
    pub proxy_url: Option<String>,
    pub tools: Arc<dyn ToolExecutor>,
    pub recommended_models: RecommendedModels,
}

/// Where a request goes and which key, if any, it carries.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub url: String,
    /// `None` when routed through the proxy, which injects the key itself.
    pub api_key: Option<String>,
}

impl AdapterContext {
    /// Resolve the endpoint for `path`. Fails with `missing_api_key` before
    /// any network traffic when a direct call has no key.
    pub(crate) fn target(
        &self,
        provider: AiProvider,
        request: &ProviderRequest,
        path: &str,
    ) -> Result<Target, AiError> {
        if request.use_proxy {
            if let Some(proxy_url) = &self.proxy_url {
                return Ok(Target {
                    url: format!("{}{}", proxy_url, path),
                    api_key: None,
                });
            }
            log::warn!(
                "Proxy routing enabled but no proxy URL configured; calling {} directly",
                provider
            );
        }

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AiError::MissingApiKey(provider.id().to_string()))?;

        Ok(Target {
            url: format!("{}{}", self.base_url, path),
            api_key: Some(api_key.to_string()),
        })
    }
}

/// Adapter for `provider`. Adding a vendor means adding a match arm here.
pub fn adapter_for(provider: AiProvider, context: AdapterContext) -> Box<dyn ProviderAdapter> {
    match provider {
        AiProvider::OpenAi => Box::new(OpenAiAdapter::new(context)),
        AiProvider::Anthropic => Box::new(AnthropicAdapter::new(context)),
        AiProvider::Xai => Box::new(XaiAdapter::new(context)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::tools::{RawToolArgs, ToolExecutionResult};
    use rig::completion::ToolDefinition;
    use std::sync::Mutex;

    /// Tool executor that records calls and answers with a fixed payload.
    #[derive(Default)]
    pub struct RecordingTools {
        pub calls: Mutex<Vec<(String, RawToolArgs)>>,
    }

    pub fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{} tool", name),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    #[async_trait]
    impl ToolExecutor for RecordingTools {
        async fn list_tool_definitions(&self) -> Vec<ToolDefinition> {
            vec![definition("get_holdings")]
        }

        async fn execute_by_name(&self, name: &str, raw_args: RawToolArgs) -> ToolExecutionResult {
            self.calls.lock().unwrap().push((name.to_string(), raw_args));
            ToolExecutionResult::Success {
                data: serde_json::json!({ "count": 1 }),
                data_provenance: vec!["repository.list_holdings".to_string()],
            }
        }
    }

    pub fn context(base_url: &str, tools: Arc<RecordingTools>) -> AdapterContext {
        AdapterContext {
            http: reqwest::Client::new(),
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            proxy_url: None,
            tools,
            recommended_models: RecommendedModels::new(),
        }
    }
}
