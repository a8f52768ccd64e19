//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`TopicRepository`] | `store` (JSON files, in-memory) |
//! | [`ResearchProvider`] | `research` (Tavily search API) |
//! | [`GenerationProvider`] | `llm` (Anthropic Messages API) |
//! | [`PublishingBackend`] | `publisher` (WordPress REST API) |
//!
//! Every collaborator call returns `Result<_, ProviderFailure>`; the adapter is
//! responsible for classifying its own transport and status errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::TopicCatalog;
use crate::errors::StoreError;
use crate::identifiers::PostId;
use crate::ledger::PublicationLedger;
use crate::research::ResearchSource;
use crate::retry::ProviderFailure;
use crate::types::TokenCount;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Durable storage of the topic catalog and the publication ledger.
///
/// Both documents sit behind one interface so an implementation can make
/// catalog and ledger updates atomic without touching the selection logic.
/// Documents are always loaded and saved whole.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Loads the topic catalog.
    async fn load_catalog(&self) -> Result<TopicCatalog, StoreError>;

    /// Replaces the topic catalog.
    async fn save_catalog(&self, catalog: &TopicCatalog) -> Result<(), StoreError>;

    /// Loads the publication ledger.
    async fn load_ledger(&self) -> Result<PublicationLedger, StoreError>;

    /// Replaces the publication ledger.
    async fn save_ledger(&self, ledger: &PublicationLedger) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// A web-search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Upper bound on returned sources.
    pub max_results: usize,
}

/// Ranked sources plus an optional synthesised answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Sources, best first.
    pub results: Vec<ResearchSource>,
    /// Provider-written summary, when requested and available.
    pub answer: Option<String>,
}

/// A web-search API.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Runs one search.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderFailure>;
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instructions.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Output token cap.
    pub max_tokens: u32,
}

/// Text returned by the model plus token accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Raw model output.
    pub text: String,
    /// Prompt tokens billed.
    pub input_tokens: TokenCount,
    /// Output tokens billed.
    pub output_tokens: TokenCount,
}

impl Completion {
    /// Input plus output tokens.
    pub fn total_tokens(&self) -> TokenCount {
        self.input_tokens + self.output_tokens
    }
}

/// A text-generation API.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Requests one completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderFailure>;
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Visibility of a created post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Live immediately.
    Publish,
    /// Saved but not visible.
    Draft,
}

/// A post to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    /// HTML body.
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
}

/// What the backend reports about a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub id: PostId,
    /// Public permalink.
    pub url: String,
    /// Status string echoed by the backend.
    pub status: String,
    /// Rendered title.
    pub title: String,
}

/// A content-management backend.
#[async_trait]
pub trait PublishingBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Creates a post.
    async fn create_post(&self, draft: &PostDraft) -> Result<PublishedPost, ProviderFailure>;

    /// Permanently deletes a post (used by the credential check).
    async fn delete_post(&self, id: PostId) -> Result<(), ProviderFailure>;
}
