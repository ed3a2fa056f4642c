//! Chat Completions dialect, spoken by OpenAI and xAI.

use async_trait::async_trait;
use rig::completion::ToolDefinition;
use serde::Deserialize;
use serde_json::{json, Value};

use super::tool_loop::{run_tool_loop, ParsedTurn, StreamState, WireDialect, WireToolCall};
use super::{AdapterContext, ProviderAdapter};
use crate::error::AiError;
use crate::providers::RecommendedModels;
use crate::tools::{RawToolArgs, ToolExecutionResult};
use crate::types::{AiFeature, AiProvider, ProviderRequest, ProviderResponse, TokenUsage};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

// ============================================================================
// Response schema
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatCompletion {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
    /// Responses-style top-level text, returned by some compatible gateways.
    output_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChoiceMessage {
    content: Option<ChatContent>,
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentPart {
    text: Option<String>,
}

impl ChatContent {
    fn into_text(self) -> String {
        match self {
            ChatContent::Text(text) => text,
            ChatContent::Parts(parts) => parts.into_iter().filter_map(|p| p.text).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatToolCall {
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionCall {
    name: String,
    /// Usually a JSON-encoded string, occasionally an object.
    arguments: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatChunk {
    model: Option<String>,
    choices: Vec<ChunkChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChunkDelta {
    content: Option<String>,
}

// ============================================================================
// Dialect
// ============================================================================

/// Chat Completions wire format; `live_search` adds xAI's search parameters.
pub(crate) struct ChatCompletionsDialect {
    provider: AiProvider,
    live_search: bool,
}

impl ChatCompletionsDialect {
    fn tool_declarations(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }
}

impl WireDialect for ChatCompletionsDialect {
    fn provider(&self) -> AiProvider {
        self.provider
    }

    fn path(&self) -> &'static str {
        CHAT_COMPLETIONS_PATH
    }

    fn headers(&self, api_key: Option<&str>) -> Vec<(&'static str, String)> {
        api_key
            .map(|key| vec![("authorization", format!("Bearer {}", key))])
            .unwrap_or_default()
    }

    fn initial_messages(&self, request: &ProviderRequest) -> Vec<Value> {
        let system = request
            .system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| json!({ "role": "system", "content": s }));

        system
            .into_iter()
            .chain(
                request
                    .messages
                    .iter()
                    .map(|m| json!({ "role": m.role.as_str(), "content": m.content })),
            )
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
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = json!(Self::tool_declarations(tools));
        }
        if stream {
            body["stream"] = json!(true);
            body["stream_options"] = json!({ "include_usage": true });
        }
        if self.live_search && request.web_search && request.feature == AiFeature::Research {
            body["search_parameters"] = json!({ "mode": "auto" });
        }
        body
    }

    fn parse_turn(&self, raw: &Value) -> ParsedTurn {
        let completion = ChatCompletion::deserialize(raw).unwrap_or_else(|e| {
            log::warn!("Unexpected {} response shape: {}", self.provider, e);
            ChatCompletion::default()
        });

        let usage = completion
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .unwrap_or_default();

        let text = message
            .content
            .map(ChatContent::into_text)
            .filter(|t| !t.is_empty())
            .or(completion.output_text)
            .unwrap_or_default();

        let tool_calls = message
            .tool_calls
            .into_iter()
            .filter(|c| !c.function.name.is_empty())
            .map(|c| WireToolCall {
                id: c.id,
                name: c.function.name,
                arguments: RawToolArgs::Json(c.function.arguments),
            })
            .collect();

        ParsedTurn {
            text,
            tool_calls,
            usage,
            model: completion.model,
        }
    }

    fn assistant_message(&self, raw: &Value, turn: &ParsedTurn) -> Value {
        if let Some(message) = raw.pointer("/choices/0/message").filter(|m| m.is_object()) {
            return message.clone();
        }
        let calls: Vec<Value> = turn
            .tool_calls
            .iter()
            .map(|c| {
                let arguments = match &c.arguments {
                    RawToolArgs::Json(Value::String(s)) | RawToolArgs::Text(s) => s.clone(),
                    RawToolArgs::Json(v) => v.to_string(),
                };
                json!({
                    "id": c.id,
                    "type": "function",
                    "function": { "name": c.name, "arguments": arguments }
                })
            })
            .collect();
        json!({ "role": "assistant", "content": Value::Null, "tool_calls": calls })
    }

    fn tool_result_messages(&self, results: Vec<(String, ToolExecutionResult)>) -> Vec<Value> {
        results
            .into_iter()
            .map(|(id, result)| {
                json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": result.to_json_string(),
                })
            })
            .collect()
    }

    fn apply_stream_event(&self, event: &Value, state: &mut StreamState) -> Option<String> {
        let chunk = ChatChunk::deserialize(event).ok()?;
        if chunk.model.is_some() {
            state.model = chunk.model;
        }
        if let Some(usage) = chunk.usage {
            state.prompt_tokens = Some(usage.prompt_tokens);
            state.completion_tokens = Some(usage.completion_tokens);
        }
        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|t| !t.is_empty())
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// OpenAI Chat Completions.
pub struct OpenAiAdapter {
    context: AdapterContext,
    dialect: ChatCompletionsDialect,
}

impl OpenAiAdapter {
    pub fn new(context: AdapterContext) -> Self {
        Self {
            context,
            dialect: ChatCompletionsDialect {
                provider: AiProvider::OpenAi,
                live_search: false,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    fn recommended_models(&self) -> RecommendedModels {
        self.context.recommended_models.clone()
    }

    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, AiError> {
        run_tool_loop(&self.dialect, &self.context, &request).await
    }
}

/// xAI (Grok). Same dialect as OpenAI plus live search for research calls.
pub struct XaiAdapter {
    context: AdapterContext,
    dialect: ChatCompletionsDialect,
}

impl XaiAdapter {
    pub fn new(context: AdapterContext) -> Self {
        Self {
            context,
            dialect: ChatCompletionsDialect {
                provider: AiProvider::Xai,
                live_search: true,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for XaiAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::Xai
    }

    fn recommended_models(&self) -> RecommendedModels {
        self.context.recommended_models.clone()
    }

    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, AiError> {
        run_tool_loop(&self.dialect, &self.context, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{context, definition, RecordingTools};
    use crate::adapters::{MAX_TOOL_ROUNDS, TOOLS_UNAVAILABLE_MESSAGE};
    use crate::types::{Message, TokenCallback};
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_completion(text: &str) -> Value {
        json!({
            "model": "gpt-4o-mini-2024",
            "choices": [{ "message": { "role": "assistant", "content": text } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        })
    }

    fn tool_completion(id: &str) -> Value {
        json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": { "name": "get_holdings", "arguments": "{\"limit\":5}" }
                    }]
                }
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 2 }
        })
    }

    fn chat_request() -> ProviderRequest {
        let mut request = ProviderRequest::new(
            "gpt-4o-mini",
            AiFeature::Chat,
            vec![Message::user("What do I own?")],
        );
        request.system = Some("You are a portfolio assistant.".to_string());
        request.tools = vec![definition("get_holdings")];
        request
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Hello")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        let mut request = chat_request();
        request.feature = AiFeature::Summary;
        let response = adapter.respond(request).await.unwrap();

        assert_eq!(response.text, "Hello");
        assert_eq!(response.model, "gpt-4o-mini-2024");
        assert_eq!(response.usage, Some(TokenUsage::new(12, 5)));
        assert!(response.tools_used.is_empty());

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[0]["messages"][0]["role"], "system");
        assert_eq!(bodies[0]["messages"][1]["content"], "What do I own?");
        // Summary is not tool-eligible.
        assert!(bodies[0].get("tools").is_none());
    }

    #[tokio::test]
    async fn test_one_tool_round() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_completion("call_1")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("You own 1 holding")))
            .mount(&server)
            .await;

        let tools = Arc::new(RecordingTools::default());
        let adapter = OpenAiAdapter::new(context(&server.uri(), tools.clone()));
        let response = adapter.respond(chat_request()).await.unwrap();

        assert_eq!(response.text, "You own 1 holding");
        assert_eq!(response.tools_used, vec!["get_holdings"]);
        assert_eq!(response.usage, Some(TokenUsage::new(22, 7)));
        assert_eq!(
            tools.calls.lock().unwrap()[0],
            ("get_holdings".to_string(), RawToolArgs::Json(json!("{\"limit\":5}")))
        );

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["tools"][0]["type"], "function");
        assert_eq!(bodies[0]["tools"][0]["function"]["name"], "get_holdings");
        assert!(bodies[1].get("tools").is_none());

        let messages = bodies[1]["messages"].as_array().unwrap();
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        let result: Value = serde_json::from_str(messages[3]["content"].as_str().unwrap()).unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["data_provenance"][0], "repository.list_holdings");
    }

    #[tokio::test]
    async fn test_tool_loop_terminates_after_four_rounds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_completion("call_x")))
            .mount(&server)
            .await;

        let tools = Arc::new(RecordingTools::default());
        let adapter = OpenAiAdapter::new(context(&server.uri(), tools.clone()));
        let err = adapter.respond(chat_request()).await.unwrap_err();

        assert_eq!(err.code(), "tool_loop");
        let bodies = request_bodies(&server).await;
        assert_eq!(bodies.len(), MAX_TOOL_ROUNDS);
        assert!(bodies[0].get("tools").is_some());
        for body in &bodies[1..] {
            assert!(body.get("tools").is_none());
        }
        // Executed once; later calls refused.
        assert_eq!(tools.calls.lock().unwrap().len(), 1);
        let last = bodies[3]["messages"].as_array().unwrap().last().unwrap().clone();
        let refused: Value = serde_json::from_str(last["content"].as_str().unwrap()).unwrap();
        assert_eq!(refused["error"], TOOLS_UNAVAILABLE_MESSAGE);
        match err {
            AiError::ToolLoop { last_response, .. } => {
                assert_eq!(last_response["choices"][0]["message"]["tool_calls"][0]["id"], "call_x")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        let err = adapter.respond(chat_request()).await.unwrap_err();
        assert_eq!(err.code(), "http_error");
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        let mut ctx = context(&server.uri(), Arc::new(RecordingTools::default()));
        ctx.api_key = None;
        let adapter = OpenAiAdapter::new(ctx);

        let err = adapter.respond(chat_request()).await.unwrap_err();
        assert_eq!(err.code(), "missing_api_key");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_body_degrades_to_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        let response = adapter.respond(chat_request()).await.unwrap();
        assert_eq!(response.text, "");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_streamed_answer() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"model\":\"gpt-4o-mini\",\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":7,\"completion_tokens\":2}}\n\n",
            "data: [DONE]\n\n"
        );
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sse)
                    .append_header("content-type", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let deltas = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = deltas.clone();
        let on_token: TokenCallback = Arc::new(move |t: &str| sink.lock().unwrap().push(t.to_string()));

        let adapter = OpenAiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        let mut request = chat_request();
        request.feature = AiFeature::Insights;
        request.stream = true;
        request.on_token = Some(on_token);
        let response = adapter.respond(request).await.unwrap();

        assert_eq!(response.text, "Hello");
        assert_eq!(response.usage, Some(TokenUsage::new(7, 2)));
        assert_eq!(*deltas.lock().unwrap(), vec!["Hel", "lo"]);
        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[0]["stream"], true);
        assert_eq!(bodies[0]["stream_options"]["include_usage"], true);
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let server = MockServer::start().await;
        let adapter = OpenAiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        let mut request = chat_request();
        let cancel = CancellationToken::new();
        cancel.cancel();
        request.cancel = cancel;

        let err = adapter.respond(request).await.unwrap_err();
        assert!(err.is_aborted());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_xai_live_search_for_research_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("ok")))
            .mount(&server)
            .await;

        let adapter = XaiAdapter::new(context(&server.uri(), Arc::new(RecordingTools::default())));
        for feature in [AiFeature::Research, AiFeature::Summary] {
            let mut request = ProviderRequest::new("grok-3", feature, vec![Message::user("news?")]);
            request.web_search = true;
            adapter.respond(request).await.unwrap();
        }

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[0]["search_parameters"]["mode"], "auto");
        assert!(bodies[1].get("search_parameters").is_none());
    }
}
