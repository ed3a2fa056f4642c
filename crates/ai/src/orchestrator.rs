//! Single entry point for AI calls.
//!
//! `call_ai` sequences one request through validation, the budget gate, the
//! response cache, the active provider adapter, cost accounting and the call
//! log. Adapters only perform the exchange; every cache, ledger and log write
//! happens here.

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{adapter_for, AdapterContext, ProviderAdapter};
use crate::cache::{compute_cache_key, CacheEntry, CacheStore};
use crate::call_log::{CallLog, CallLogEntry};
use crate::env::AiEnvironment;
use crate::error::AiError;
use crate::ledger::{month_key, UsageLedger};
use crate::pricing::estimate_usage_cost;
use crate::providers::{AiSettings, ProviderService, RecommendedModels};
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::types::{AiFeature, AiProvider, AiRequest, AiResponse, ProviderRequest};

/// Month-to-date spend against the configured budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub month: String,
    pub usage_usd: f64,
    /// Zero when no budget is configured.
    pub budget_usd: f64,
    pub remaining_usd: Option<f64>,
}

/// Provider and model a request resolved to.
#[derive(Debug, Clone)]
struct Route {
    provider: AiProvider,
    model: String,
}

fn resolve_provider(settings: &AiSettings) -> Result<AiProvider, AiError> {
    settings
        .provider_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AiError::ProviderMissing)?
        .parse()
}

/// Per-call override; else no caching for streamed or planning calls; else the
/// settings default.
fn resolve_ttl(request: &AiRequest, streaming: bool, settings: &AiSettings) -> u64 {
    match request.cache_ttl_secs {
        Some(ttl) => ttl,
        None if streaming || request.feature == AiFeature::Planning => 0,
        None => settings.cache_ttl_secs,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Orchestrates AI calls for one application environment.
pub struct AiOrchestrator<E: AiEnvironment + 'static> {
    providers: ProviderService<E>,
    tools: Arc<ToolRegistry<E>>,
    http: reqwest::Client,
    cache: CacheStore,
    ledger: UsageLedger,
    call_log: CallLog,
}

impl<E: AiEnvironment + 'static> AiOrchestrator<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self::with_http_client(env, reqwest::Client::new())
    }

    pub fn with_http_client(env: Arc<E>, http: reqwest::Client) -> Self {
        let repo = env.ai_repository();
        Self {
            providers: ProviderService::new(env.clone()),
            tools: Arc::new(ToolRegistry::new(env)),
            http,
            cache: CacheStore::new(repo.clone()),
            ledger: UsageLedger::new(repo.clone()),
            call_log: CallLog::new(repo),
        }
    }

    pub fn provider_service(&self) -> &ProviderService<E> {
        &self.providers
    }

    pub fn tool_registry(&self) -> Arc<ToolRegistry<E>> {
        self.tools.clone()
    }

    /// Run one request. Every outcome except an abort is recorded in the call
    /// log when logging is enabled. A failed settings read is recorded under
    /// the default settings.
    pub async fn call_ai(&self, request: AiRequest) -> Result<AiResponse, AiError> {
        let started = Instant::now();
        let now = Utc::now();
        let mut entry = CallLogEntry::new(request.feature, now);
        let settings = match self.providers.get_settings() {
            Ok(settings) => settings,
            Err(e) => return Err(self.reject(&AiSettings::default(), entry, e).await),
        };

        // Validation and budget gate: no network traffic on rejection.
        let route = match self.route(&settings, &request, &mut entry) {
            Ok(route) => route,
            Err(e) => return Err(self.reject(&settings, entry, e).await),
        };
        if let Err(e) = self.ledger.check_budget(settings.monthly_budget_usd, now) {
            return Err(self.reject(&settings, entry, e).await);
        }

        let cache_key = compute_cache_key(
            route.provider,
            &route.model,
            request.feature,
            request.system.as_deref(),
            &request.messages,
        );
        entry.cache_key = Some(cache_key.clone());
        self.cache.purge_expired(now).await;

        let streaming = request.stream && settings.streaming_enabled;
        let ttl = resolve_ttl(&request, streaming, &settings);

        if !request.force_refresh && ttl > 0 {
            if let Some(hit) = self.cache.get(&cache_key, now) {
                let cached = hit.value.response;
                debug!("Cache hit for {} ({})", request.feature, cache_key);
                if let Some(on_token) = &request.on_token {
                    on_token(&cached.text);
                }

                entry.ok = true;
                entry.cache_hit = true;
                entry.model = Some(cached.model.clone());
                self.log(&settings, entry).await;

                return Ok(AiResponse {
                    text: cached.text,
                    provider: route.provider,
                    model: cached.model,
                    usage: cached.usage,
                    from_cache: true,
                    tools_used: cached.tools_used,
                    cache_key,
                    estimated_cost_usd: 0.0,
                    duration_ms: 0,
                });
            }
        }

        if request.cancel.is_cancelled() {
            return Err(AiError::Aborted);
        }

        let adapter = match self.adapter(route.provider, &settings) {
            Ok(adapter) => adapter,
            Err(e) => return Err(self.reject(&settings, entry, e).await),
        };
        let tools = if request.feature.is_tool_eligible() {
            self.tools.list_tool_definitions().await
        } else {
            Vec::new()
        };

        info!(
            "AI call: feature={} provider={} model={}",
            request.feature, route.provider, route.model
        );
        let provider_request = ProviderRequest {
            model: route.model.clone(),
            feature: request.feature,
            system: request.system.clone(),
            messages: request.messages.clone(),
            tools,
            stream: streaming,
            cancel: request.cancel.clone(),
            on_token: request.on_token.clone(),
            use_proxy: settings.use_proxy,
            web_search: settings.web_search,
        };
        let result = adapter.respond(provider_request).await;
        let duration_ms = elapsed_ms(started);

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_aborted() => {
                info!("AI call aborted after {} ms", duration_ms);
                return Err(AiError::Aborted);
            }
            Err(e) => {
                entry.duration_ms = duration_ms;
                return Err(self.reject(&settings, entry, e).await);
            }
        };

        let cost = estimate_usage_cost(&response.model, response.usage.as_ref());
        let finished = Utc::now();
        if let Err(e) = self.ledger.record(cost, finished).await {
            warn!("Failed to record AI usage: {}", e);
        }
        if ttl > 0 {
            self.cache
                .put(CacheEntry::new(
                    cache_key.clone(),
                    response.clone(),
                    request.feature,
                    route.provider,
                    ttl,
                    finished,
                ))
                .await;
        }

        entry = entry.with_usage(response.usage.as_ref());
        entry.ok = true;
        entry.model = Some(response.model.clone());
        entry.estimated_cost_usd = cost;
        entry.duration_ms = duration_ms;
        self.log(&settings, entry).await;

        info!(
            "AI call finished: provider={} model={} cost=${:.6} in {} ms",
            route.provider, response.model, cost, duration_ms
        );
        Ok(AiResponse {
            text: response.text,
            provider: route.provider,
            model: response.model,
            usage: response.usage,
            from_cache: false,
            tools_used: response.tools_used,
            cache_key,
            estimated_cost_usd: cost,
            duration_ms,
        })
    }

    /// Recommended models of the active provider.
    pub fn recommended_models(&self) -> Result<RecommendedModels, AiError> {
        let settings = self.providers.get_settings()?;
        let provider = resolve_provider(&settings)?;
        Ok(self.adapter(provider, &settings)?.recommended_models())
    }

    pub fn usage_summary(&self) -> Result<UsageSummary, AiError> {
        let settings = self.providers.get_settings()?;
        let now = Utc::now();
        let usage_usd = self.ledger.current_usage(now)?;
        let budget_usd = settings.monthly_budget_usd.max(0.0);
        Ok(UsageSummary {
            month: month_key(now),
            usage_usd,
            budget_usd,
            remaining_usd: (budget_usd > 0.0).then(|| (budget_usd - usage_usd).max(0.0)),
        })
    }

    /// Most recent call log entries, newest first.
    pub fn recent_calls(&self, limit: usize) -> Result<Vec<CallLogEntry>, AiError> {
        self.call_log.recent(limit)
    }

    fn route(
        &self,
        settings: &AiSettings,
        request: &AiRequest,
        entry: &mut CallLogEntry,
    ) -> Result<Route, AiError> {
        if request.messages.is_empty() {
            return Err(AiError::invalid_input("At least one message is required"));
        }
        let provider = resolve_provider(settings)?;
        entry.provider = provider.id().to_string();

        let model = settings
            .model_for(provider, request.feature)
            .ok_or_else(|| AiError::ModelMissing {
                provider: provider.id().to_string(),
                feature: request.feature.to_string(),
            })?
            .to_string();
        entry.model = Some(model.clone());
        Ok(Route { provider, model })
    }

    fn adapter(
        &self,
        provider: AiProvider,
        settings: &AiSettings,
    ) -> Result<Box<dyn ProviderAdapter>, AiError> {
        let tools: Arc<dyn ToolExecutor> = self.tools.clone();
        let context = AdapterContext {
            http: self.http.clone(),
            api_key: self.providers.get_api_key(provider)?,
            base_url: self.providers.base_url(provider, settings)?,
            proxy_url: self.providers.proxy_url(provider, settings),
            tools,
            recommended_models: self.providers.recommended_models(provider)?,
        };
        Ok(adapter_for(provider, context))
    }

    /// Log a failed call and hand the error back.
    async fn reject(&self, settings: &AiSettings, entry: CallLogEntry, error: AiError) -> AiError {
        warn!("AI call failed ({}): {}", error.code(), error);
        self.log(settings, entry.with_error(&error)).await;
        error
    }

    async fn log(&self, settings: &AiSettings, entry: CallLogEntry) {
        if settings.logging_enabled {
            self.call_log.append(entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_log::UNAVAILABLE_PROVIDER;
    use crate::env::test_env::MockEnvironment;
    use crate::repository::AiRepositoryTrait;
    use crate::types::{Message, TokenCallback};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gpt-4o-mini";

    fn settings_for(server: &MockServer) -> AiSettings {
        let mut settings = AiSettings {
            provider_id: Some("openai".to_string()),
            ..AiSettings::default()
        };
        for feature in AiFeature::ALL {
            settings.set_model(AiProvider::OpenAi, feature, MODEL);
        }
        settings
            .provider_urls
            .insert("openai".to_string(), server.uri());
        settings
    }

    fn env_with(settings: &AiSettings) -> Arc<MockEnvironment> {
        Arc::new(
            MockEnvironment::new()
                .with_secret("OPENAI_API_KEY", "sk-test")
                .with_ai_settings(settings),
        )
    }

    fn completion(text: &str) -> Value {
        json!({
            "model": MODEL,
            "choices": [{ "message": { "role": "assistant", "content": text } }],
            "usage": { "prompt_tokens": 1000, "completion_tokens": 500 }
        })
    }

    fn tool_call_completion() -> Value {
        json!({
            "model": MODEL,
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "get_holdings", "arguments": "{}" }
                    }]
                }
            }]
        })
    }

    async fn mount_answer(server: &MockServer, text: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(text)))
            .mount(server)
            .await;
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    fn recorder() -> (TokenCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: TokenCallback = Arc::new(move |t: &str| sink.lock().unwrap().push(t.to_string()));
        (callback, seen)
    }

    fn summary_request() -> AiRequest {
        AiRequest::new(AiFeature::Summary, vec![Message::user("Summarize my portfolio")])
            .with_system("Be concise.")
    }

    #[tokio::test]
    async fn test_provider_missing_is_logged() {
        let env = Arc::new(MockEnvironment::new());
        let orchestrator = AiOrchestrator::new(env);

        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "provider_missing");

        let logs = orchestrator.recent_calls(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].provider, UNAVAILABLE_PROVIDER);
        assert_eq!(logs[0].error_code.as_deref(), Some("provider_missing"));
        assert!(!logs[0].ok);
    }

    #[tokio::test]
    async fn test_settings_read_failure_is_logged() {
        let env = Arc::new(MockEnvironment::new().with_failing_settings());
        let orchestrator = AiOrchestrator::new(env);

        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "core_error");

        let logs = orchestrator.recent_calls(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].provider, UNAVAILABLE_PROVIDER);
        assert_eq!(logs[0].error_code.as_deref(), Some("core_error"));
        assert!(logs[0]
            .message
            .as_deref()
            .unwrap()
            .contains("settings table unavailable"));
    }

    #[tokio::test]
    async fn test_locked_secret_store_fails_without_request() {
        let server = MockServer::start().await;
        mount_answer(&server, "unused").await;
        let settings = settings_for(&server);
        let env = Arc::new(
            MockEnvironment::new()
                .with_ai_settings(&settings)
                .with_locked_secrets(),
        );
        let orchestrator = AiOrchestrator::new(env);

        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "core_error");
        assert!(err.to_string().contains("Secret store error"));
        assert_eq!(request_count(&server).await, 0);

        let logs = orchestrator.recent_calls(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].provider, "openai");
        assert_eq!(logs[0].error_code.as_deref(), Some("core_error"));
    }

    #[tokio::test]
    async fn test_unsupported_provider_and_missing_model() {
        let env = env_with(&AiSettings {
            provider_id: Some("mistral".to_string()),
            ..AiSettings::default()
        });
        let err = AiOrchestrator::new(env).call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "provider_not_supported");

        let env = env_with(&AiSettings {
            provider_id: Some("anthropic".to_string()),
            ..AiSettings::default()
        });
        let orchestrator = AiOrchestrator::new(env);
        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "model_missing");
        assert_eq!(orchestrator.recent_calls(1).unwrap()[0].provider, "anthropic");
    }

    #[tokio::test]
    async fn test_budget_gate_makes_no_request() {
        let server = MockServer::start().await;
        mount_answer(&server, "unused").await;
        let mut settings = settings_for(&server);
        settings.monthly_budget_usd = 100.0;
        let env = env_with(&settings);
        env.ai_repository
            .add_usage(&month_key(Utc::now()), 100.0)
            .await
            .unwrap();

        let orchestrator = AiOrchestrator::new(env);
        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();

        assert_eq!(err.code(), "budget_exceeded");
        assert_eq!(request_count(&server).await, 0);
        assert_eq!(
            orchestrator.recent_calls(1).unwrap()[0].error_code.as_deref(),
            Some("budget_exceeded")
        );
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        mount_answer(&server, "unused").await;
        let env = Arc::new(MockEnvironment::new().with_ai_settings(&settings_for(&server)));

        let err = AiOrchestrator::new(env)
            .call_ai(summary_request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "missing_api_key");
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn test_success_records_cost_cache_and_log() {
        let server = MockServer::start().await;
        mount_answer(&server, "All good.").await;
        let env = env_with(&settings_for(&server));
        let orchestrator = AiOrchestrator::new(env.clone());

        let response = orchestrator.call_ai(summary_request()).await.unwrap();

        assert_eq!(response.text, "All good.");
        assert!(!response.from_cache);
        assert_eq!(response.provider, AiProvider::OpenAi);
        // gpt-4o-mini: 1000 * 0.15 / 1e6 + 500 * 0.6 / 1e6
        assert!((response.estimated_cost_usd - 0.00045).abs() < 1e-12);

        let usage = orchestrator.usage_summary().unwrap();
        assert!((usage.usage_usd - 0.00045).abs() < 1e-12);
        assert_eq!(usage.remaining_usd, None);
        assert_eq!(env.ai_repository.cache_len().unwrap(), 1);

        let log = &orchestrator.recent_calls(1).unwrap()[0];
        assert!(log.ok);
        assert!(!log.cache_hit);
        assert_eq!(log.prompt_tokens, 1000);
        assert_eq!(log.completion_tokens, 500);
        assert_eq!(log.cache_key.as_deref(), Some(response.cache_key.as_str()));
    }

    #[tokio::test]
    async fn test_cache_replay_drives_callback_once() {
        let server = MockServer::start().await;
        mount_answer(&server, "Cached answer").await;
        let orchestrator = AiOrchestrator::new(env_with(&settings_for(&server)));

        let first = orchestrator
            .call_ai(summary_request().with_cache_ttl(600))
            .await
            .unwrap();

        let (callback, seen) = recorder();
        let second = orchestrator
            .call_ai(
                summary_request()
                    .with_cache_ttl(600)
                    .with_token_callback(callback),
            )
            .await
            .unwrap();

        assert!(second.from_cache);
        assert_eq!(second.text, first.text);
        assert_eq!(*seen.lock().unwrap(), vec!["Cached answer"]);
        assert_eq!(second.estimated_cost_usd, 0.0);
        assert_eq!(second.duration_ms, 0);
        assert_eq!(request_count(&server).await, 1);

        let logs = orchestrator.recent_calls(2).unwrap();
        assert!(logs[0].cache_hit);
        assert_eq!(logs[0].estimated_cost_usd, 0.0);
        assert_eq!(logs[0].prompt_tokens, 0);
    }

    #[tokio::test]
    async fn test_cache_key_ignores_stream_and_cancel() {
        let server = MockServer::start().await;
        mount_answer(&server, "Same").await;
        let orchestrator = AiOrchestrator::new(env_with(&settings_for(&server)));

        let first = orchestrator.call_ai(summary_request()).await.unwrap();
        let (callback, _) = recorder();
        let second = orchestrator
            .call_ai(
                summary_request()
                    .with_stream(callback)
                    .with_cancel(CancellationToken::new())
                    .with_cache_ttl(600)
                    .with_label("dashboard"),
            )
            .await
            .unwrap();

        assert_eq!(first.cache_key, second.cache_key);
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn test_force_refresh_and_planning_bypass_cache() {
        let server = MockServer::start().await;
        mount_answer(&server, "fresh").await;
        let orchestrator = AiOrchestrator::new(env_with(&settings_for(&server)));

        orchestrator.call_ai(summary_request()).await.unwrap();
        let refreshed = orchestrator
            .call_ai(summary_request().force_refresh())
            .await
            .unwrap();
        assert!(!refreshed.from_cache);

        let planning = || AiRequest::new(AiFeature::Planning, vec![Message::user("Plan my year")]);
        orchestrator.call_ai(planning()).await.unwrap();
        let second = orchestrator.call_ai(planning()).await.unwrap();
        assert!(!second.from_cache);
        assert_eq!(request_count(&server).await, 4);
    }

    #[tokio::test]
    async fn test_tool_loop_through_orchestrator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_completion()))
            .mount(&server)
            .await;
        let env = env_with(&settings_for(&server));
        let orchestrator = AiOrchestrator::new(env.clone());

        let err = orchestrator
            .call_ai(AiRequest::new(AiFeature::Chat, vec![Message::user("What do I own?")]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "tool_loop");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 4);
        let bodies: Vec<Value> = requests
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies[0]["tools"].as_array().unwrap().len(), 10);
        assert!(bodies[1..].iter().all(|b| b.get("tools").is_none()));

        assert_eq!(env.ai_repository.cache_len().unwrap(), 0);
        let log = &orchestrator.recent_calls(1).unwrap()[0];
        assert_eq!(log.error_code.as_deref(), Some("tool_loop"));
    }

    #[tokio::test]
    async fn test_http_error_is_logged_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1000)))
            .mount(&server)
            .await;
        let env = env_with(&settings_for(&server));
        let orchestrator = AiOrchestrator::new(env.clone());

        let err = orchestrator.call_ai(summary_request()).await.unwrap_err();
        assert_eq!(err.code(), "http_error");
        assert_eq!(env.ai_repository.cache_len().unwrap(), 0);

        let log = &orchestrator.recent_calls(1).unwrap()[0];
        assert!(!log.ok);
        assert_eq!(log.provider, "openai");
        assert_eq!(log.message.as_ref().unwrap().chars().count(), 240);
        assert_eq!(orchestrator.usage_summary().unwrap().usage_usd, 0.0);
    }

    #[tokio::test]
    async fn test_abort_mid_flight_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("too late"))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;
        let env = env_with(&settings_for(&server));
        let orchestrator = AiOrchestrator::new(env.clone());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = orchestrator
            .call_ai(summary_request().with_cancel(cancel))
            .await
            .unwrap_err();
        assert!(err.is_aborted());
        assert!(orchestrator.recent_calls(10).unwrap().is_empty());
        assert_eq!(env.ai_repository.cache_len().unwrap(), 0);
        assert_eq!(orchestrator.usage_summary().unwrap().usage_usd, 0.0);
    }

    #[tokio::test]
    async fn test_logging_disabled() {
        let server = MockServer::start().await;
        mount_answer(&server, "quiet").await;
        let mut settings = settings_for(&server);
        settings.logging_enabled = false;
        let orchestrator = AiOrchestrator::new(env_with(&settings));

        orchestrator.call_ai(summary_request()).await.unwrap();
        assert!(orchestrator.recent_calls(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommended_models_of_active_provider() {
        let env = Arc::new(MockEnvironment::new().with_provider(AiProvider::Anthropic, "claude-haiku-4-5"));
        let models = AiOrchestrator::new(env).recommended_models().unwrap();
        assert_eq!(models[&AiFeature::Summary], vec!["claude-haiku-4-5"]);
    }
}
