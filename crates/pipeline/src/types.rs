//! Shared value types for the article pipeline domain.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Token accounting
// ---------------------------------------------------------------------------

/// Number of tokens consumed by a generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serialised as RFC 3339. Deserialisation also accepts a naive
/// ISO-8601 timestamp without offset, read as UTC, so ledgers written by older
/// tooling keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parses RFC 3339, falling back to a naive ISO-8601 timestamp read as UTC.
    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        value
            .parse::<NaiveDateTime>()
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}

// ---------------------------------------------------------------------------
// Pipeline progress
// ---------------------------------------------------------------------------

/// The stages of one pipeline run, in strict order.
///
/// A run that fails reports the stage that was in flight; a successful run
/// ends in [`PipelineStage::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Environment/configuration validated.
    ConfigLoaded,
    /// Adapters and orchestrators constructed.
    ModulesReady,
    /// A topic has been chosen (or supplied by the operator).
    TopicSelected,
    /// Research sources gathered.
    Researched,
    /// Article drafted and normalised.
    Generated,
    /// Post created on the publishing backend.
    Published,
    /// Publication recorded in the ledger.
    Logged,
    /// Run complete.
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ConfigLoaded => "config_loaded",
            Self::ModulesReady => "modules_ready",
            Self::TopicSelected => "topic_selected",
            Self::Researched => "researched",
            Self::Generated => "generated",
            Self::Published => "published",
            Self::Logged => "logged",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}
