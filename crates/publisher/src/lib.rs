//! Publishing infrastructure adapter.
//!
//! Implements the [`pipeline::PublishingBackend`] trait for the WordPress REST
//! API (`/wp-json/wp/v2/posts`), authenticating with an application password
//! over HTTP basic auth.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The publish orchestrator in `nodes` decides whether a
//! failure is retried. This adapter only classifies: an unreadable *success*
//! body is reported as [`FailureKind::Other`], because the post may already
//! exist and must not be created twice.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    classify_http_status, parse_retry_after, FailureKind, PostDraft, PostId, ProviderFailure,
    PublishedPost, PublishingBackend,
};
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use tracing::debug;

/// Per-request network timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const POSTS_PATH: &str = "/wp-json/wp/v2/posts";

/// WordPress REST client.
pub struct WordPressPublisher {
    http: reqwest::Client,
    site_url: String,
    username: String,
    app_password: String,
}

impl std::fmt::Debug for WordPressPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordPressPublisher")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("app_password", &"***")
            .finish()
    }
}

impl WordPressPublisher {
    /// `site_url` is the site root; a trailing slash is ignored.
    pub fn new(
        site_url: &str,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("articlegen/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            site_url: site_url.trim_end_matches('/').to_owned(),
            username: username.into(),
            app_password: app_password.into(),
        })
    }

    fn posts_url(&self) -> String {
        format!("{}{POSTS_PATH}", self.site_url)
    }
}

#[derive(Deserialize)]
struct PostPayload {
    id: u64,
    link: String,
    status: String,
    #[serde(default)]
    title: Option<RenderedTitle>,
}

/// WordPress returns `{"rendered": "..."}` in `view` context, a bare string in
/// some plugins' responses.
#[derive(Deserialize)]
#[serde(untagged)]
enum RenderedTitle {
    Rendered { rendered: String },
    Plain(String),
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    message: String,
}

#[async_trait]
impl PublishingBackend for WordPressPublisher {
    fn name(&self) -> &'static str {
        "wordpress"
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<PublishedPost, ProviderFailure> {
        let response = self
            .http
            .post(self.posts_url())
            .basic_auth(&self.username, Some(&self.app_password))
            .json(draft)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        let body = read_body(response).await?;
        parse_created_post(&body, &draft.title)
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ProviderFailure> {
        let response = self
            .http
            .delete(format!("{}/{id}", self.posts_url()))
            .query(&[("force", "true")])
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        read_body(response).await.map(|_| ())
    }
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ProviderFailure> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let bytes = response.bytes().await.map_err(|e| classify_transport(&e))?;
    debug!(status, bytes = bytes.len(), "wordpress response received");
    match failure_from_status(status, retry_after, &bytes) {
        Some(failure) => Err(failure),
        None => Ok(bytes.to_vec()),
    }
}

fn classify_transport(err: &reqwest::Error) -> ProviderFailure {
    if err.is_timeout() || err.is_connect() {
        ProviderFailure::unreachable(err.to_string())
    } else {
        ProviderFailure::new(FailureKind::Other, err.to_string())
    }
}

/// Non-2xx responses. WordPress error bodies carry `{code, message}`.
fn failure_from_status(
    status: u16,
    retry_after: Option<Duration>,
    body: &[u8],
) -> Option<ProviderFailure> {
    let kind = classify_http_status(status, retry_after)?;
    let message = match serde_json::from_slice::<ApiError>(body) {
        Ok(err) => format!("WordPress API error ({}): {}", err.code, err.message),
        Err(_) => format!(
            "HTTP {status}: {}",
            String::from_utf8_lossy(body).chars().take(200).collect::<String>()
        ),
    };
    Some(ProviderFailure::new(kind, message))
}

fn parse_created_post(body: &[u8], requested_title: &str) -> Result<PublishedPost, ProviderFailure> {
    let payload: PostPayload = serde_json::from_slice(body).map_err(|e| {
        ProviderFailure::new(
            FailureKind::Other,
            format!("post may have been created but the response was unreadable: {e}"),
        )
    })?;
    let title = match payload.title {
        Some(RenderedTitle::Rendered { rendered }) | Some(RenderedTitle::Plain(rendered)) => {
            rendered
        }
        None => requested_title.to_owned(),
    };
    Ok(PublishedPost {
        id: PostId::new(payload.id),
        url: payload.link,
        status: payload.status,
        title,
    })
}
