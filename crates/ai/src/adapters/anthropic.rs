//! Anthropic Messages API dialect.

use async_trait::async_trait;
use rig::completion::ToolDefinition;
use serde::Deserialize;
use serde_json::{json, Value};

use super::tool_loop::{run_tool_loop, ParsedTurn, StreamState, WireDialect, WireToolCall};
use super::{AdapterContext, ProviderAdapter};
use crate::error::AiError;
use crate::providers::RecommendedModels;
use crate::tools::{RawToolArgs, ToolExecutionResult};
use crate::types::{AiProvider, MessageRole, ProviderRequest, ProviderResponse, TokenUsage};

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 4096;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessagesResponse {
    model: Option<String>,
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StreamMessage,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageDelta {
        #[serde(default)]
        usage: AnthropicUsage,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StreamMessage {
    model: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

pub(crate) struct MessagesDialect;

impl WireDialect for MessagesDialect {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    fn path(&self) -> &'static str {
        MESSAGES_PATH
    }

    fn headers(&self, api_key: Option<&str>) -> Vec<(&'static str, String)> {
        let mut headers = vec![("anthropic-version", ANTHROPIC_VERSION.to_string())];
        if let Some(key) = api_key {
            headers.push(("x-api-key", key.to_string()));
        }
        headers
    }

    /// No `system` role: system messages become user turns, and consecutive
    /// turns of the same role are merged.
    fn initial_messages(&self, request: &ProviderRequest) -> Vec<Value> {
        let mut turns: Vec<(&'static str, String)> = Vec::new();
        for message in &request.messages {
            let role = match message.role {
                MessageRole::Assistant => "assistant",
                MessageRole::User | MessageRole::System => "user",
            };
            match turns.last_mut() {
                Some((last_role, content)) if *last_role == role => {
                    content.push_str("\n\n");
                    content.push_str(&message.content);
                }
                _ => turns.push((role, message.content.clone())),
            }
        }
        turns
            .into_iter()
            .map(|(role, content)| json!({ "role": role, "content": content }))
            .collect()
    }

    fn build_body(
        &self,
        request: &ProviderRequest,
        messages: &[Value],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> Value {
        let mut body = json!({
            "model": request.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "messages": messages,
        });
        if let Some(system) = request.system.as_deref().filter(|s| !s.trim().is_empty()) {
            body["system"] = json!(system);
        }
        if !tools.is_empty() {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            body["tools"] = json!(declarations);
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    fn parse_turn(&self, raw: &Value) -> ParsedTurn {
        let response = MessagesResponse::deserialize(raw).unwrap_or_else(|e| {
            log::warn!("Unexpected anthropic response shape: {}", e);
            MessagesResponse::default()
        });

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in response.content {
            match block {
                ContentBlock::Text { text: t } => text.push_str(&t),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(WireToolCall {
                    id,
                    name,
                    arguments: RawToolArgs::Json(input),
                }),
                ContentBlock::Other => {}
            }
        }

        ParsedTurn {
            text,
            tool_calls,
            usage: response.usage.map(|u| {
                TokenUsage::new(u.input_tokens.unwrap_or(0), u.output_tokens.unwrap_or(0))
            }),
            model: response.model,
        }
    }

    fn assistant_message(&self, raw: &Value, turn: &ParsedTurn) -> Value {
        if let Some(content) = raw.get("content").filter(|c| c.is_array()) {
            return json!({ "role": "assistant", "content": content });
        }
        let blocks: Vec<Value> = turn
            .tool_calls
            .iter()
            .map(|c| {
                let input = match &c.arguments {
                    RawToolArgs::Json(v) => v.clone(),
                    RawToolArgs::Text(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({})),
                };
                json!({ "type": "tool_use", "id": c.id, "name": c.name, "input": input })
            })
            .collect();
        json!({ "role": "assistant", "content": blocks })
    }

    fn tool_result_messages(&self, results: Vec<(String, ToolExecutionResult)>) -> Vec<Value> {
        let blocks: Vec<Value> = results
            .into_iter()
            .map(|(id, result)| {
                json!({
                    "type": "tool_result",
                    "tool_use_id": id,
                    "content": result.to_json_string(),
                    "is_error": !result.is_success(),
                })
            })
            .collect();
        vec![json!({ "role": "user", "content": blocks })]
    }

    fn apply_stream_event(&self, event: &Value, state: &mut StreamState) -> Option<String> {
        match StreamEvent::deserialize(event).ok()? {
            StreamEvent::MessageStart { message } => {
                state.model = message.model;
                state.prompt_tokens = message.usage.input_tokens;
                if message.usage.output_tokens.is_some() {
                    state.completion_tokens = message.usage.output_tokens;
                }
                None
            }
            StreamEvent::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } => Some(text).filter(|t| !t.is_empty()),
            StreamEvent::MessageDelta { usage } => {
                if usage.output_tokens.is_some() {
                    state.completion_tokens = usage.output_tokens;
                }
                None
            }
            _ => None,
        }
    }
}

/// Anthropic Messages API.
pub struct AnthropicAdapter {
    context: AdapterContext,
}

impl AnthropicAdapter {
    pub fn new(context: AdapterContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    fn recommended_models(&self) -> RecommendedModels {
        self.context.recommended_models.clone()
    }

    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, AiError> {
        run_tool_loop(&MessagesDialect, &self.context, &request).await
    }
}
