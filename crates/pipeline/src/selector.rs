//! Category rotation with a recency cooldown.
//!
//! [`select_next`] is a pure function of the catalog, the ledger, and the
//! cooldown window. It never mutates the ledger: the chosen category index is
//! returned in the [`TopicSelection`] and the caller persists it (see
//! [`crate::topics::TopicManager::next_topic`]).
//!
//! Algorithm:
//!
//! 1. The *recent set* is the lowercased topics of the last `cooldown_window`
//!    ledger records.
//! 2. Starting at the category after the ledger cursor (the first category
//!    when the cursor is unset), visit every category once, wrapping around.
//! 3. In each category take the first topic, in catalog order, that is not in
//!    the recent set.
//! 4. If every topic is cooling down, reuse the oldest ledger record instead of
//!    stalling. This breaks the no-repeat guarantee on purpose.
//!
//! A cursor left pointing past the end of a catalog that has since shrunk is
//! folded back with `mod n`, so the rotation continues but may skip ahead.

use tracing::{debug, warn};

use crate::catalog::TopicCatalog;
use crate::errors::TopicError;
use crate::ledger::PublicationLedger;

/// How a topic was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Regular rotation; the cursor must move to `category_index`.
    Rotation {
        /// Index of the chosen category in the catalog.
        category_index: usize,
    },
    /// Every topic is cooling down; the cursor stays where it is.
    Fallback,
}

/// Result of [`select_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    /// Topic to write about.
    pub topic: String,
    /// Display name of its category.
    pub category_name: String,
    /// How the topic was chosen.
    pub source: SelectionSource,
}

impl TopicSelection {
    /// The new cursor value, if the selection moves the rotation.
    pub fn category_index(&self) -> Option<usize> {
        match self.source {
            SelectionSource::Rotation { category_index } => Some(category_index),
            SelectionSource::Fallback => None,
        }
    }
}

/// Chooses the next topic. Deterministic for a given catalog and ledger.
pub fn select_next(
    catalog: &TopicCatalog,
    ledger: &PublicationLedger,
    cooldown_window: usize,
) -> Result<TopicSelection, TopicError> {
    let count = catalog.len();
    if count == 0 {
        return Err(TopicError::EmptyCatalog);
    }

    let recent = ledger.recent_topics(cooldown_window);
    let start = ledger.last_category_index.map_or(0, |last| last + 1);

    for offset in 0..count {
        let index = (start + offset) % count;
        let category = &catalog.categories()[index];
        let available = category
            .topics
            .iter()
            .find(|topic| !recent.contains(&topic.to_lowercase()));
        if let Some(topic) = available {
            debug!(category = %category.key, index, offset, "category has an available topic");
            return Ok(TopicSelection {
                topic: topic.clone(),
                category_name: category.name.clone(),
                source: SelectionSource::Rotation {
                    category_index: index,
                },
            });
        }
    }

    if let Some(oldest) = ledger.oldest() {
        warn!(topic = %oldest.topic, "all topics in cooldown, reusing the oldest publication");
        return Ok(TopicSelection {
            topic: oldest.topic.clone(),
            category_name: oldest.category.clone(),
            source: SelectionSource::Fallback,
        });
    }

    let first = &catalog.categories()[0];
    let topic = first.topics.first().ok_or(TopicError::EmptyCatalog)?;
    warn!(topic = %topic, "no publication history, selecting the first topic");
    Ok(TopicSelection {
        topic: topic.clone(),
        category_name: first.name.clone(),
        source: SelectionSource::Fallback,
    })
}
