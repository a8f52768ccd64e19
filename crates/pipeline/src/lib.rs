//! Core domain for the travel-article pipeline.
//!
//! This crate contains the topic catalog and publication ledger model, the
//! rotation/cooldown topic selector, the retry policy shared by every external
//! call, article normalisation rules, and the port traits that infrastructure
//! crates implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates (`store`, `research`,
//! `llm`, `publisher`) define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CategoryKey`, `PostId`, `PipelineRunId`) |
//! | [`types`] | Shared value types (`TokenCount`, `Timestamp`, `PipelineStage`) |
//! | [`errors`] | Retry-policy type and the per-collaborator error taxonomy |
//! | [`retry`] | Failure kinds, HTTP classification, and backoff schedules |
//! | [`catalog`] | Ordered topic catalog and the seeded default catalog |
//! | [`ledger`] | Publication records and the rotation cursor |
//! | [`selector`] | The rotation + cooldown selection algorithm |
//! | [`topics`] | `TopicManager`: selection, publication logging, statistics |
//! | [`research`] | Research sources and prompt-context rendering |
//! | [`article`] | Generated payload extraction and article normalisation |
//! | [`ports`] | Traits implemented by infrastructure crates |

pub mod article;
pub mod catalog;
pub mod errors;
pub mod identifiers;
pub mod ledger;
pub mod ports;
pub mod research;
pub mod retry;
pub mod selector;
pub mod topics;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use article::{
    extract_payload, ArticlePayload, ArticleResult, EXCERPT_MAX_CHARS, EXCERPT_MIN_CHARS,
    MAX_WORDS, MIN_WORDS, REQUIRED_KEYWORD,
};
pub use catalog::{Category, TopicCatalog};
pub use errors::{
    GenerationError, PipelineError, PublishError, ResearchError, RetryPolicy, StoreError,
    TopicError,
};
pub use identifiers::{CategoryKey, PipelineRunId, PostId};
pub use ledger::{PublicationLedger, PublicationRecord};
pub use ports::{
    Completion, CompletionRequest, GenerationProvider, PostDraft, PostStatus, PublishedPost,
    PublishingBackend, ResearchProvider, SearchRequest, SearchResponse, TopicRepository,
};
pub use research::{ResearchResult, ResearchSource};
pub use retry::{
    classify_http_status, parse_retry_after, FailureKind, ProviderFailure, RetryDecision,
    RetrySchedule,
};
pub use selector::{select_next, SelectionSource, TopicSelection};
pub use topics::{TopicManager, TopicStats, DEFAULT_COOLDOWN_WINDOW, UNKNOWN_CATEGORY};
pub use types::{PipelineStage, Timestamp, TokenCount};
