//! Retry-policy type and the error taxonomy of the article pipeline.
//!
//! [`PipelineError`] is what the pipeline driver reports: one variant per stage,
//! each mapping 1:1 to a process exit code. The per-collaborator errors
//! ([`ResearchError`], [`GenerationError`], [`PublishError`]) are raised by the
//! call orchestrators once a failure is final, i.e. non-retryable or retried
//! until the call site's attempt cap.
//!
//! Every fatal error message carries a remediation hint so the operator knows
//! which credential or setting to check, not only the raw provider text.
//!
//! [`RetryPolicy`] is a cross-cutting concern: every failure kind must be able
//! to produce one (see [`crate::retry::FailureKind::retry_policy`]).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::{FailureKind, ProviderFailure};
use crate::types::PipelineStage;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Produced by [`FailureKind::retry_policy`] to let the orchestrator decide
/// whether to re-invoke an external call.
///
/// ## Rules
///
/// - `Retryable` failures: rate limits, connection failures and timeouts,
///   server faults, malformed responses.
/// - `NonRetryable` failures: rejected credentials, missing permissions, and
///   anything the provider reports that is not known to be transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the delay before retrying, as derived from
    /// a `Retry-After` response header.
    Retryable {
        /// Server-provided wait. `None` means apply the caller's own back-off
        /// schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the pipeline run fails.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Store and topic errors
// ---------------------------------------------------------------------------

/// Failure to load or persist one of the two durable documents (topic catalog,
/// publication ledger).
///
/// Always fatal to topic selection. When raised while logging a publication
/// that already went live, the driver only logs it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The document could not be read or written.
    #[error(
        "Failed to access {document}: {reason}. Check that the path exists and is writable."
    )]
    Unavailable {
        /// Document label, usually its file path.
        document: String,
        /// Underlying I/O failure.
        reason: String,
    },

    /// The document was read but its content is not a valid catalog/ledger.
    #[error(
        "{document} is not valid: {reason}. Fix the JSON by hand, or delete the file to have it recreated."
    )]
    Corrupt {
        /// Document label, usually its file path.
        document: String,
        /// Parser message.
        reason: String,
    },
}

/// Errors raised while choosing the next topic.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopicError {
    /// The catalog or ledger could not be loaded, parsed, or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The catalog has no category with at least one topic.
    #[error("The topic catalog has no topics. Add one with `articlegen add-topic <CATEGORY> <TOPIC>`.")]
    EmptyCatalog,
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Final failure of the web-research call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResearchError {
    /// Still rate limited after every permitted attempt.
    #[error("Research API rate limit exceeded ({detail}). Wait a few minutes or check the plan quota of TAVILY_API_KEY.")]
    RateLimited { detail: String },

    /// The research API could not be reached.
    #[error("Unable to reach the research API ({detail}). Check the network connection.")]
    Unreachable { detail: String },

    /// The API rejected the credentials.
    #[error("Research API rejected the request ({detail}). Check TAVILY_API_KEY.")]
    Unauthorized { detail: String },

    /// The API kept answering with a body that could not be understood.
    #[error("Research API returned an unexpected response ({detail}).")]
    Malformed { detail: String },

    /// Any other provider failure.
    #[error("Failed to research topic: {detail}")]
    Other { detail: String },
}

impl ResearchError {
    /// Maps a final provider failure onto the research error taxonomy.
    pub fn from_failure(failure: ProviderFailure) -> Self {
        let detail = failure.message;
        match failure.kind {
            FailureKind::RateLimited { .. } => Self::RateLimited { detail },
            FailureKind::Unreachable | FailureKind::ServerFault => Self::Unreachable { detail },
            FailureKind::Unauthorized | FailureKind::Forbidden => Self::Unauthorized { detail },
            FailureKind::Malformed => Self::Malformed { detail },
            FailureKind::Other => Self::Other { detail },
        }
    }
}

/// Final failure of the article-generation call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    /// Still rate limited after every permitted attempt.
    #[error("Generation API rate limit exceeded ({detail}). Wait before re-running or raise the account's rate limit.")]
    RateLimited { detail: String },

    /// The generation API could not be reached or kept failing server-side.
    #[error("Unable to reach the generation API ({detail}). Check the network connection and the provider status page.")]
    Unreachable { detail: String },

    /// The API rejected the credentials.
    #[error("Generation API rejected the request ({detail}). Check ANTHROPIC_API_KEY.")]
    Unauthorized { detail: String },

    /// The model never produced a valid `{title, content, excerpt, keywords}` payload.
    #[error("Invalid article payload from the generation API: {detail}")]
    Malformed { detail: String },

    /// Any other provider failure.
    #[error("Article generation failed: {detail}")]
    Other { detail: String },
}

impl GenerationError {
    /// Maps a final provider failure onto the generation error taxonomy.
    pub fn from_failure(failure: ProviderFailure) -> Self {
        let detail = failure.message;
        match failure.kind {
            FailureKind::RateLimited { .. } => Self::RateLimited { detail },
            FailureKind::Unreachable | FailureKind::ServerFault => Self::Unreachable { detail },
            FailureKind::Unauthorized | FailureKind::Forbidden => Self::Unauthorized { detail },
            FailureKind::Malformed => Self::Malformed { detail },
            FailureKind::Other => Self::Other { detail },
        }
    }
}

/// Final failure of the publish call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PublishError {
    /// HTTP 401.
    #[error(
        "Authentication failed ({detail}). Verify WORDPRESS_USERNAME, and make sure \
         WORDPRESS_APP_PASSWORD is an Application Password (Users → Profile → Application \
         Passwords), not the login password."
    )]
    Unauthorized { detail: String },

    /// HTTP 403.
    #[error(
        "Permission denied ({detail}). The WordPress user needs the 'Author' role or higher, \
         Application Passwords must be enabled, and no security plugin may block the REST API."
    )]
    Forbidden { detail: String },

    /// HTTP 429 on every permitted attempt.
    #[error("Rate limited by the publishing backend ({detail}). Try again later.")]
    RateLimited { detail: String },

    /// HTTP 5xx on every permitted attempt.
    #[error("Publishing backend server error ({detail}). The site may be temporarily unavailable.")]
    ServerFault { detail: String },

    /// Connection failure or timeout on every permitted attempt.
    #[error(
        "Unable to connect to the publishing backend ({detail}). Check that WORDPRESS_URL is \
         correct and reachable from this machine."
    )]
    Unreachable { detail: String },

    /// Any other status, carrying the backend's own code and message.
    #[error("Publishing failed: {detail}")]
    Other { detail: String },
}

impl PublishError {
    /// Maps a final provider failure onto the publish error taxonomy.
    pub fn from_failure(failure: ProviderFailure) -> Self {
        let detail = failure.message;
        match failure.kind {
            FailureKind::Unauthorized => Self::Unauthorized { detail },
            FailureKind::Forbidden => Self::Forbidden { detail },
            FailureKind::RateLimited { .. } => Self::RateLimited { detail },
            FailureKind::ServerFault => Self::ServerFault { detail },
            FailureKind::Unreachable => Self::Unreachable { detail },
            FailureKind::Malformed | FailureKind::Other => Self::Other { detail },
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that stop a pipeline run, one variant per failing stage.
///
/// A failure while logging the publication is deliberately absent: the post is
/// already live, so that stage's failure is logged and the run still succeeds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Configuration is missing or invalid, or a module could not be built.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem, including hints.
        message: String,
    },

    /// Topic selection failed.
    #[error("Topic selection failed: {0}")]
    Topic(#[from] TopicError),

    /// Web research failed.
    #[error("Research failed: {0}")]
    Research(#[from] ResearchError),

    /// Article generation failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Publishing failed.
    #[error("Publishing failed: {0}")]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// The stage that was in flight when the run stopped.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Configuration { .. } => PipelineStage::ConfigLoaded,
            Self::Topic(_) => PipelineStage::TopicSelected,
            Self::Research(_) => PipelineStage::Researched,
            Self::Generation(_) => PipelineStage::Generated,
            Self::Publish(_) => PipelineStage::Published,
        }
    }

    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } => 1,
            Self::Topic(_) => 2,
            Self::Research(_) => 3,
            Self::Generation(_) => 4,
            Self::Publish(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_stage_order() {
        let errors = [
            PipelineError::Configuration {
                message: "missing".into(),
            },
            PipelineError::Topic(TopicError::EmptyCatalog),
            PipelineError::Research(ResearchError::Other { detail: "x".into() }),
            PipelineError::Generation(GenerationError::Other { detail: "x".into() }),
            PipelineError::Publish(PublishError::Other { detail: "x".into() }),
        ];
        let codes: Vec<u8> = errors.iter().map(PipelineError::exit_code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn publish_unauthorized_message_names_the_credentials() {
        let err = PublishError::from_failure(ProviderFailure::new(
            FailureKind::Unauthorized,
            "HTTP 401",
        ));
        assert!(matches!(err, PublishError::Unauthorized { .. }));
        let text = err.to_string();
        assert!(text.contains("WORDPRESS_USERNAME"));
        assert!(text.contains("WORDPRESS_APP_PASSWORD"));
    }

    #[test]
    fn publish_never_reports_malformed_as_retry_candidate() {
        let err = PublishError::from_failure(ProviderFailure::malformed("missing id"));
        assert!(matches!(err, PublishError::Other { .. }));
    }

    #[test]
    fn research_server_fault_reports_unreachable() {
        let err = ResearchError::from_failure(ProviderFailure::new(
            FailureKind::ServerFault,
            "HTTP 502",
        ));
        assert!(matches!(err, ResearchError::Unreachable { .. }));
    }
}
