//! Failure classification and backoff schedules for external calls.
//!
//! Every adapter reports failures as a [`ProviderFailure`]: one closed
//! [`FailureKind`] plus a human-readable message. The orchestrators never look
//! at provider-native error types; they pattern-match on the kind and ask a
//! [`RetrySchedule`] what to do next.
//!
//! Backoff before the attempt after failed attempt `k` (1-based) is
//! `base * 2^(k-1)`, unless the failure carries a server-provided wait, which
//! overrides the computed delay.

use std::fmt;
use std::time::Duration;

use crate::errors::RetryPolicy;

// ---------------------------------------------------------------------------
// Failure kinds
// ---------------------------------------------------------------------------

/// The closed set of ways an external call can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Too many requests. `retry_after` is the server's `Retry-After` hint.
    RateLimited {
        /// Explicit wait requested by the server, if any.
        retry_after: Option<Duration>,
    },
    /// Connection refused, DNS failure, or timeout.
    Unreachable,
    /// Credentials rejected (HTTP 401).
    Unauthorized,
    /// Credentials accepted but the action is not allowed (HTTP 403).
    Forbidden,
    /// The response arrived but its shape is wrong.
    Malformed,
    /// The server failed (HTTP 5xx).
    ServerFault,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Whether this kind of failure may be retried, and after what delay.
    pub fn retry_policy(self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable { after: retry_after },
            Self::Unreachable | Self::ServerFault | Self::Malformed => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Unauthorized | Self::Forbidden | Self::Other => RetryPolicy::NonRetryable,
        }
    }

    /// Short label used in log fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Unreachable => "unreachable",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Malformed => "malformed",
            Self::ServerFault => "server_fault",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified failure reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Classification driving the retry decision.
    pub kind: FailureKind,
    /// Provider detail, kept for the final error message.
    pub message: String,
}

impl ProviderFailure {
    /// Creates a failure of the given kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`FailureKind::Malformed`] failure.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Malformed, message)
    }

    /// Shorthand for a [`FailureKind::Unreachable`] failure.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unreachable, message)
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for ProviderFailure {}

// ---------------------------------------------------------------------------
// HTTP classification
// ---------------------------------------------------------------------------

/// Maps an HTTP status code to a failure kind.
///
/// Returns `None` for any 2xx status. Adapters call this first and only
/// special-case the codes their provider uses differently.
pub fn classify_http_status(status: u16, retry_after: Option<Duration>) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        401 => Some(FailureKind::Unauthorized),
        403 => Some(FailureKind::Forbidden),
        429 => Some(FailureKind::RateLimited { retry_after }),
        500..=599 => Some(FailureKind::ServerFault),
        _ => Some(FailureKind::Other),
    }
}

/// Parses a `Retry-After` header given in whole seconds.
///
/// The HTTP-date form is ignored; callers then fall back to their schedule.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Backoff schedule
// ---------------------------------------------------------------------------

/// What an orchestrator does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then make the next attempt.
    RetryAfter(Duration),
    /// Stop and surface the failure.
    GiveUp,
}

/// Per-call-site retry tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    /// Hard cap on attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay for connection failures, server faults, malformed responses.
    pub base_delay: Duration,
    /// Base delay for rate-limit failures without a server hint.
    pub rate_limit_base_delay: Duration,
}

impl RetrySchedule {
    /// Creates a schedule using the same base delay for every retryable kind.
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            rate_limit_base_delay: base_delay,
        }
    }

    /// Overrides the base delay used for rate-limit failures.
    pub const fn with_rate_limit_base_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_base_delay = delay;
        self
    }

    /// Computed delay after failed attempt `attempt` (1-based), ignoring any
    /// server hint.
    pub fn backoff(&self, kind: FailureKind, attempt: u32) -> Duration {
        let base = match kind {
            FailureKind::RateLimited { .. } => self.rate_limit_base_delay,
            _ => self.base_delay,
        };
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        base.saturating_mul(factor)
    }

    /// Decides what to do after attempt `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        match kind.retry_policy() {
            RetryPolicy::NonRetryable => RetryDecision::GiveUp,
            RetryPolicy::Retryable { .. } if attempt >= self.max_attempts => RetryDecision::GiveUp,
            RetryPolicy::Retryable { after } => {
                RetryDecision::RetryAfter(after.unwrap_or_else(|| self.backoff(kind, attempt)))
            }
        }
    }
}
