//! Cancellable HTTP exchange shared by every adapter.

use futures::StreamExt;
use log::{debug, warn};
use reqwest::Response;
use serde_json::Value;
use std::future::Future;

use super::sse::SseDecoder;
use super::Target;
use crate::error::AiError;
use crate::types::{AiProvider, ProviderRequest};

/// Vendor error messages longer than this are cut in `http_error`.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Race `future` against the request's cancellation token.
pub(crate) async fn cancellable<T>(
    request: &ProviderRequest,
    future: impl Future<Output = T>,
) -> Result<T, AiError> {
    tokio::select! {
        biased;
        _ = request.cancel.cancelled() => Err(AiError::Aborted),
        value = future => Ok(value),
    }
}

/// Send a JSON body and return the response once the status is known to be 2xx.
async fn send(
    http: &reqwest::Client,
    provider: AiProvider,
    target: &Target,
    headers: &[(&'static str, String)],
    body: &Value,
    request: &ProviderRequest,
) -> Result<Response, AiError> {
    let mut builder = http.post(&target.url).json(body);
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }

    debug!("POST {} ({})", target.url, provider);
    let response = cancellable(request, builder.send())
        .await?
        .map_err(|e| AiError::client(format!("{} request failed: {}", provider, e)))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = cancellable(request, response.text())
        .await?
        .unwrap_or_default();
    let error = http_error(provider, status.as_u16(), &text);
    log::error!("{}", error);
    Err(error)
}

/// POST and decode the body as JSON. An unparseable 2xx body becomes `Null`.
pub(crate) async fn post_json(
    http: &reqwest::Client,
    provider: AiProvider,
    target: &Target,
    headers: &[(&'static str, String)],
    body: &Value,
    request: &ProviderRequest,
) -> Result<Value, AiError> {
    let response = send(http, provider, target, headers, body, request).await?;
    let text = cancellable(request, response.text())
        .await?
        .map_err(|e| AiError::client(format!("Failed to read {} response: {}", provider, e)))?;

    Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("Unparseable {} response body: {}", provider, e);
        Value::Null
    }))
}

/// POST a streaming request, handing each decoded SSE payload to `on_event`.
pub(crate) async fn post_stream(
    http: &reqwest::Client,
    provider: AiProvider,
    target: &Target,
    headers: &[(&'static str, String)],
    body: &Value,
    request: &ProviderRequest,
    mut on_event: impl FnMut(Value),
) -> Result<(), AiError> {
    let response = send(http, provider, target, headers, body, request).await?;
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    let mut handle = |data: String| match serde_json::from_str::<Value>(&data) {
        Ok(event) => on_event(event),
        Err(e) => warn!("Skipping unparseable {} stream event: {}", provider, e),
    };

    while let Some(chunk) = cancellable(request, stream.next()).await? {
        let chunk = chunk
            .map_err(|e| AiError::client(format!("{} stream interrupted: {}", provider, e)))?;
        for data in decoder.feed(&chunk) {
            handle(data);
        }
    }
    if let Some(data) = decoder.finish() {
        handle(data);
    }
    Ok(())
}

/// Build `http_error` from a non-2xx body: vendor `error.message` when the
/// body is JSON, else the raw text.
pub(crate) fn http_error(provider: AiProvider, status: u16, body: &str) -> AiError {
    let details: Option<Value> = serde_json::from_str(body).ok();

    let vendor_message = details.as_ref().and_then(|d| {
        d.pointer("/error/message")
            .or_else(|| d.get("error").filter(|e| e.is_string()))
            .or_else(|| d.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let message = vendor_message
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty()).then(|| text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect())
        })
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        });

    AiError::Http {
        provider: provider.id().to_string(),
        status,
        message,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_extracts_vendor_message() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"model not found"}}"#;
        let err = http_error(AiProvider::Anthropic, 404, body);
        assert_eq!(err.code(), "http_error");
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "anthropic request failed with HTTP 404: model not found"
        );
        assert_eq!(err.details().unwrap()["error"]["type"], "invalid_request_error");
    }

    #[test]
    fn test_http_error_raw_text() {
        let err = http_error(AiProvider::OpenAi, 502, "Bad gateway from upstream");
        assert!(err.to_string().ends_with("Bad gateway from upstream"));
        assert!(err.details().is_none());
    }

    #[test]
    fn test_http_error_empty_body() {
        let err = http_error(AiProvider::Xai, 429, "");
        assert!(err.to_string().ends_with("Too Many Requests"));
    }
}
