//! Article generation infrastructure adapter.
//!
//! Implements the [`pipeline::GenerationProvider`] trait for Anthropic's
//! Messages API. Additional providers are added as new `impl` blocks in this
//! crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and classification of status codes (including `529 Overloaded`) live here.
//! The [`pipeline`] crate sees only [`pipeline::GenerationProvider`]; the
//! generation orchestrator in `nodes` owns back-off.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    classify_http_status, parse_retry_after, Completion, CompletionRequest, FailureKind,
    GenerationProvider, ProviderFailure, TokenCount,
};
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Messages API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Value sent in the `anthropic-version` header.
pub const API_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Per-request network timeout. Long-form generation is slow.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Anthropic Messages API client.
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(api_key, model, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("articlegen/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderFailure> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let bytes = response.bytes().await.map_err(|e| classify_transport(&e))?;
        debug!(status, model = %self.model, bytes = bytes.len(), "messages response received");

        if let Some(failure) = failure_from_status(status, retry_after, &bytes) {
            return Err(failure);
        }
        parse_completion(&bytes)
    }
}

fn classify_transport(err: &reqwest::Error) -> ProviderFailure {
    if err.is_timeout() || err.is_connect() {
        ProviderFailure::unreachable(err.to_string())
    } else if err.is_decode() || err.is_body() {
        ProviderFailure::malformed(err.to_string())
    } else {
        ProviderFailure::new(FailureKind::Other, err.to_string())
    }
}

/// Maps a non-2xx response to a failure. `529 Overloaded` falls in the
/// server-fault band and is retried like any other 5xx.
fn failure_from_status(
    status: u16,
    retry_after: Option<Duration>,
    body: &[u8],
) -> Option<ProviderFailure> {
    let kind = classify_http_status(status, retry_after)?;
    let detail = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}", envelope.error.kind, envelope.error.message),
        Err(_) => String::from_utf8_lossy(body).chars().take(200).collect(),
    };
    Some(ProviderFailure::new(kind, format!("HTTP {status}: {detail}")))
}

fn parse_completion(body: &[u8]) -> Result<Completion, ProviderFailure> {
    let response: MessagesResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderFailure::malformed(format!("unexpected messages response: {e}")))?;
    let text = response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| ProviderFailure::malformed("response contained no text block"))?;
    Ok(Completion {
        text,
        input_tokens: TokenCount::new(response.usage.input_tokens),
        output_tokens: TokenCount::new(response.usage.output_tokens),
    })
}
