//! The bounded tool-calling loop shared by every dialect.

use log::{debug, info};
use rig::completion::ToolDefinition;
use serde_json::Value;

use super::http;
use super::AdapterContext;
use crate::error::AiError;
use crate::tools::{RawToolArgs, ToolExecutionResult};
use crate::types::{AiProvider, ProviderRequest, ProviderResponse, TokenUsage};

/// Round-trips allowed per `respond` call.
pub const MAX_TOOL_ROUNDS: usize = 4;

/// Tool result sent back for invocations made after the tool round is spent.
pub const TOOLS_UNAVAILABLE_MESSAGE: &str =
    "Tool use is no longer available for this request. Answer with the information already gathered.";

/// A tool call as read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WireToolCall {
    pub id: String,
    pub name: String,
    pub arguments: RawToolArgs,
}

/// One non-streamed vendor response, normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParsedTurn {
    pub text: String,
    pub tool_calls: Vec<WireToolCall>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
}

/// Accumulated state of a streamed response.
#[derive(Debug, Default)]
pub(crate) struct StreamState {
    pub text: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub model: Option<String>,
}

impl StreamState {
    pub fn usage(&self) -> Option<TokenUsage> {
        if self.prompt_tokens.is_none() && self.completion_tokens.is_none() {
            return None;
        }
        Some(TokenUsage::new(
            self.prompt_tokens.unwrap_or(0),
            self.completion_tokens.unwrap_or(0),
        ))
    }
}

/// What differs between vendors: URL path, headers, message and tool shapes,
/// response schema.
pub(crate) trait WireDialect: Send + Sync {
    fn provider(&self) -> AiProvider;

    fn path(&self) -> &'static str;

    /// Request headers. `api_key` is `None` for proxied calls.
    fn headers(&self, api_key: Option<&str>) -> Vec<(&'static str, String)>;

    /// The canonical transcript in this dialect's message shape.
    fn initial_messages(&self, request: &ProviderRequest) -> Vec<Value>;

    /// Full request body. `tools` is empty when none may be declared.
    fn build_body(
        &self,
        request: &ProviderRequest,
        messages: &[Value],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> Value;

    fn parse_turn(&self, raw: &Value) -> ParsedTurn;

    /// The assistant's tool-call message, to be appended to the transcript.
    fn assistant_message(&self, raw: &Value, turn: &ParsedTurn) -> Value;

    /// Messages carrying tool results, keyed by call id.
    fn tool_result_messages(&self, results: Vec<(String, ToolExecutionResult)>) -> Vec<Value>;

    /// Fold one stream event into `state`, returning the text delta it carried.
    fn apply_stream_event(&self, event: &Value, state: &mut StreamState) -> Option<String>;
}

fn add_usage(total: &mut Option<TokenUsage>, usage: Option<TokenUsage>) {
    if let Some(usage) = usage {
        total.get_or_insert_with(TokenUsage::default).add(&usage);
    }
}

/// Run `request` to a final answer.
///
/// Tools are declared on the first round only. After the model has used them,
/// further invocations are refused with [`TOOLS_UNAVAILABLE_MESSAGE`] unless the
/// response also carries text, which is then taken as the answer.
pub(crate) async fn run_tool_loop<D: WireDialect>(
    dialect: &D,
    context: &AdapterContext,
    request: &ProviderRequest,
) -> Result<ProviderResponse, AiError> {
    let provider = dialect.provider();
    let target = context.target(provider, request, dialect.path())?;
    let headers = dialect.headers(target.api_key.as_deref());

    let declared: &[ToolDefinition] = if request.feature.is_tool_eligible() {
        &request.tools
    } else {
        &[]
    };
    let mut allow_tools = !declared.is_empty();
    let mut messages = dialect.initial_messages(request);
    let mut usage: Option<TokenUsage> = None;
    let mut tools_used: Vec<String> = Vec::new();
    let mut last_raw = Value::Null;

    for round in 1..=MAX_TOOL_ROUNDS {
        if request.cancel.is_cancelled() {
            return Err(AiError::Aborted);
        }
        let tools = if allow_tools { declared } else { &[] };
        debug!(
            "{} round {}/{}: {} messages, {} tools",
            provider,
            round,
            MAX_TOOL_ROUNDS,
            messages.len(),
            tools.len()
        );

        if tools.is_empty() && request.wants_stream() {
            let body = dialect.build_body(request, &messages, tools, true);
            let mut state = StreamState::default();
            http::post_stream(
                &context.http,
                provider,
                &target,
                &headers,
                &body,
                request,
                |event| {
                    if let Some(delta) = dialect.apply_stream_event(&event, &mut state) {
                        request.emit(&delta);
                        state.text.push_str(&delta);
                    }
                },
            )
            .await?;
            add_usage(&mut usage, state.usage());
            info!("{} streamed answer after {} round(s)", provider, round);
            return Ok(ProviderResponse {
                model: state.model.unwrap_or_else(|| request.model.clone()),
                text: state.text,
                usage,
                raw: last_raw,
                tools_used,
            });
        }

        let body = dialect.build_body(request, &messages, tools, false);
        let raw = http::post_json(&context.http, provider, &target, &headers, &body, request).await?;
        let turn = dialect.parse_turn(&raw);
        add_usage(&mut usage, turn.usage);

        let has_text = !turn.text.trim().is_empty();
        if turn.tool_calls.is_empty() || (!allow_tools && has_text) {
            request.emit(&turn.text);
            info!("{} answered after {} round(s)", provider, round);
            return Ok(ProviderResponse {
                model: turn.model.unwrap_or_else(|| request.model.clone()),
                text: turn.text,
                usage,
                raw,
                tools_used,
            });
        }

        messages.push(dialect.assistant_message(&raw, &turn));
        let mut results = Vec::with_capacity(turn.tool_calls.len());
        if allow_tools {
            allow_tools = false;
            for call in turn.tool_calls {
                if request.cancel.is_cancelled() {
                    return Err(AiError::Aborted);
                }
                let result = context
                    .tools
                    .execute_by_name(&call.name, call.arguments)
                    .await;
                if !tools_used.contains(&call.name) {
                    tools_used.push(call.name);
                }
                results.push((call.id, result));
            }
        } else {
            debug!(
                "{} requested {} tool call(s) after the tool round; refusing",
                provider,
                turn.tool_calls.len()
            );
            for call in turn.tool_calls {
                results.push((call.id, ToolExecutionResult::failure(TOOLS_UNAVAILABLE_MESSAGE)));
            }
        }
        messages.extend(dialect.tool_result_messages(results));
        last_raw = raw;
    }

    Err(AiError::ToolLoop {
        provider: provider.id().to_string(),
        rounds: MAX_TOOL_ROUNDS,
        last_response: last_raw,
    })
}
