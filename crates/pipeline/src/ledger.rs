//! The publication ledger: append-only history plus the rotation cursor.
//!
//! ```json
//! { "articles": [{"topic": "...", "title": "...", "url": "...", "category": "...", "date": "..."}],
//!   "last_category_index": -1 }
//! ```
//!
//! `last_category_index` is `-1` in the document when no category has been
//! used yet; in memory it is `None`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One published article. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Topic string as selected (or supplied by the operator).
    #[serde(default)]
    pub topic: String,
    /// Title of the published article.
    #[serde(default)]
    pub title: String,
    /// Public URL returned by the publishing backend.
    #[serde(default)]
    pub url: String,
    /// Resolved category display name.
    #[serde(default)]
    pub category: String,
    /// When the publication was recorded.
    pub date: Timestamp,
}

/// Publication history (oldest first) and the last category index used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationLedger {
    /// Records, oldest first.
    #[serde(default)]
    pub articles: Vec<PublicationRecord>,
    /// Index into the catalog's categories of the last selection.
    #[serde(default, with = "cursor")]
    pub last_category_index: Option<usize>,
}

impl PublicationLedger {
    /// Lowercased topics of the last `window` records.
    pub fn recent_topics(&self, window: usize) -> HashSet<String> {
        let start = self.articles.len().saturating_sub(window);
        self.articles[start..]
            .iter()
            .map(|record| record.topic.to_lowercase())
            .collect()
    }

    /// The oldest record, if any.
    pub fn oldest(&self) -> Option<&PublicationRecord> {
        self.articles.first()
    }

    /// Appends a record.
    pub fn append(&mut self, record: PublicationRecord) {
        self.articles.push(record);
    }

    /// Records, most recent first, optionally capped at `limit`.
    pub fn history(&self, limit: Option<usize>) -> Vec<PublicationRecord> {
        let newest_first = self.articles.iter().rev().cloned();
        match limit {
            Some(limit) => newest_first.take(limit).collect(),
            None => newest_first.collect(),
        }
    }
}

/// `Option<usize>` <-> JSON integer with `-1` for `None`.
mod cursor {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => serializer.serialize_u64(*index as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}
