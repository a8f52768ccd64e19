//! Web research infrastructure adapter.
//!
//! Implements the [`pipeline::ResearchProvider`] trait for the Tavily search
//! API (`POST /search`, bearer-token authentication).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and classification of transport/status failures into
//! [`pipeline::FailureKind`] live here. Retrying is *not* done here: the
//! research orchestrator in `nodes` owns the retry loop.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    classify_http_status, parse_retry_after, FailureKind, ProviderFailure, ResearchProvider,
    ResearchSource, SearchRequest, SearchResponse,
};
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Per-request network timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tavily search client.
pub struct TavilyProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for TavilyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

impl TavilyProvider {
    /// Builds a client for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    /// Builds a client for a custom endpoint (self-hosted proxy, tests).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("articlegen/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    answer: Option<String>,
    results: Vec<ResearchSource>,
}

#[async_trait]
impl ResearchProvider for TavilyProvider {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderFailure> {
        let body = SearchBody {
            query: &request.query,
            search_depth: "advanced",
            include_answer: true,
            max_results: request.max_results,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
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
        debug!(status, bytes = bytes.len(), "search response received");

        if let Some(failure) = failure_from_status(status, retry_after, &bytes) {
            return Err(failure);
        }
        parse_search_response(&bytes, request.max_results)
    }
}

/// Classifies a transport-level error.
fn classify_transport(err: &reqwest::Error) -> ProviderFailure {
    if err.is_timeout() || err.is_connect() {
        ProviderFailure::unreachable(err.to_string())
    } else if err.is_decode() || err.is_body() {
        ProviderFailure::malformed(err.to_string())
    } else {
        ProviderFailure::new(FailureKind::Other, err.to_string())
    }
}

/// Classifies a non-success status, using the API's `detail.error` message when present.
fn failure_from_status(
    status: u16,
    retry_after: Option<Duration>,
    body: &[u8],
) -> Option<ProviderFailure> {
    let kind = classify_http_status(status, retry_after)?;
    let detail = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/detail/error")
                .or_else(|| v.get("detail"))
                .and_then(|d| d.as_str().map(str::to_owned))
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).chars().take(200).collect());
    Some(ProviderFailure::new(kind, format!("HTTP {status}: {detail}")))
}

fn parse_search_response(body: &[u8], max_results: usize) -> Result<SearchResponse, ProviderFailure> {
    let payload: SearchPayload = serde_json::from_slice(body)
        .map_err(|e| ProviderFailure::malformed(format!("unexpected search response: {e}")))?;
    let mut results = payload.results;
    results.truncate(max_results);
    Ok(SearchResponse {
        results,
        answer: payload.answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_and_answer() {
        let body = br#"{
            "query": "Valtos Beach Parga Greece",
            "answer": "Valtos is a long sandy beach west of Parga.",
            "results": [
                {"title": "Valtos Beach", "url": "https://a", "content": "Sandy.", "score": 0.93},
                {"title": "Parga beaches", "url": "https://b", "content": "Many.", "score": 0.71},
                {"title": "Extra", "url": "https://c", "content": "More.", "score": 0.2}
            ]
        }"#;
        let response = parse_search_response(body, 2).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].title, "Valtos Beach");
        assert!((response.results[0].score - 0.93).abs() < f64::EPSILON);
        assert!(response.answer.unwrap().starts_with("Valtos"));
    }

    #[test]
    fn missing_results_is_malformed() {
        let failure = parse_search_response(br#"{"answer": null}"#, 5).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Malformed);
    }

    #[test]
    fn error_status_uses_api_detail() {
        let failure = failure_from_status(
            401,
            None,
            br#"{"detail": {"error": "Unauthorized: missing or invalid API key."}}"#,
        )
        .unwrap();
        assert_eq!(failure.kind, FailureKind::Unauthorized);
        assert!(failure.message.contains("invalid API key"));
    }

    #[test]
    fn rate_limit_keeps_retry_after() {
        let failure = failure_from_status(429, Some(Duration::from_secs(3)), b"slow down").unwrap();
        assert_eq!(
            failure.kind,
            FailureKind::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
        assert!(failure.message.ends_with("slow down"));
        assert!(failure_from_status(200, None, b"{}").is_none());
    }
}
