//! Topic management on top of a [`TopicRepository`].
//!
//! [`TopicManager`] owns the read-select-persist sequence: it loads both
//! documents, runs [`select_next`], and saves the new rotation cursor *before*
//! handing the topic to the pipeline. A crash after selection therefore still
//! advances the rotation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::errors::{StoreError, TopicError};
use crate::ledger::PublicationRecord;
use crate::ports::TopicRepository;
use crate::selector::{select_next, TopicSelection};
use crate::types::Timestamp;

/// Number of most recent publications whose topics may not be reselected.
pub const DEFAULT_COOLDOWN_WINDOW: usize = 10;

/// Category recorded when a topic matches no catalog category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Summary of the catalog and ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStats {
    pub total_topics: usize,
    pub total_published: usize,
    /// `(category name, topic count)` in rotation order.
    pub categories: Vec<(String, usize)>,
    pub cooldown_window: usize,
    /// Distinct topics among the last `cooldown_window` publications.
    pub topics_in_cooldown: usize,
}

/// Selects topics and records publications.
#[derive(Clone)]
pub struct TopicManager {
    repository: Arc<dyn TopicRepository>,
    cooldown_window: usize,
}

impl TopicManager {
    /// Creates a manager over `repository`.
    pub fn new(repository: Arc<dyn TopicRepository>, cooldown_window: usize) -> Self {
        Self {
            repository,
            cooldown_window,
        }
    }

    /// Selects the next topic and persists the advanced rotation cursor.
    #[instrument(skip(self), fields(cooldown = self.cooldown_window))]
    pub async fn next_topic(&self) -> Result<TopicSelection, TopicError> {
        let catalog = self.repository.load_catalog().await?;
        let mut ledger = self.repository.load_ledger().await?;

        let selection = select_next(&catalog, &ledger, self.cooldown_window)?;
        if let Some(index) = selection.category_index() {
            ledger.last_category_index = Some(index);
            self.repository.save_ledger(&ledger).await?;
        }

        info!(
            topic = %selection.topic,
            category = %selection.category_name,
            "selected topic"
        );
        Ok(selection)
    }

    /// Appends a publication record to the ledger.
    ///
    /// When `category` is `None` or empty, it is resolved from the catalog
    /// (case-insensitive topic match), defaulting to [`UNKNOWN_CATEGORY`].
    #[instrument(skip(self, title, url))]
    pub async fn record_publication(
        &self,
        topic: &str,
        title: &str,
        url: &str,
        category: Option<&str>,
    ) -> Result<PublicationRecord, StoreError> {
        let category = match category.filter(|c| !c.is_empty()) {
            Some(category) => category.to_owned(),
            None => self.resolve_category(topic).await?,
        };

        let mut ledger = self.repository.load_ledger().await?;
        let record = PublicationRecord {
            topic: topic.to_owned(),
            title: title.to_owned(),
            url: url.to_owned(),
            category,
            date: Timestamp::now(),
        };
        ledger.append(record.clone());
        self.repository.save_ledger(&ledger).await?;

        info!(title = %record.title, url = %record.url, "logged publication");
        Ok(record)
    }

    async fn resolve_category(&self, topic: &str) -> Result<String, StoreError> {
        let catalog = self.repository.load_catalog().await?;
        Ok(catalog
            .category_name_for(topic)
            .unwrap_or(UNKNOWN_CATEGORY)
            .to_owned())
    }

    /// Adds `topic` to the category with key `category_key`.
    ///
    /// Returns `false` without writing when the category does not exist or
    /// already holds the topic (ignoring case).
    #[instrument(skip(self))]
    pub async fn add_topic(&self, category_key: &str, topic: &str) -> Result<bool, StoreError> {
        let mut catalog = self.repository.load_catalog().await?;
        let Some(category) = catalog.category_mut(category_key) else {
            warn!("category not found");
            return Ok(false);
        };
        if !category.add_topic(topic) {
            warn!("topic already exists in category");
            return Ok(false);
        }
        self.repository.save_catalog(&catalog).await?;
        info!("added topic");
        Ok(true)
    }

    /// Publication history, most recent first.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<PublicationRecord>, StoreError> {
        Ok(self.repository.load_ledger().await?.history(limit))
    }

    /// Every `(topic, category name)` pair in rotation order.
    pub async fn all_topics(&self) -> Result<Vec<(String, String)>, StoreError> {
        let catalog = self.repository.load_catalog().await?;
        Ok(catalog
            .categories()
            .iter()
            .flat_map(|c| c.topics.iter().map(|t| (t.clone(), c.name.clone())))
            .collect())
    }

    /// Catalog and ledger statistics.
    pub async fn stats(&self) -> Result<TopicStats, StoreError> {
        let catalog = self.repository.load_catalog().await?;
        let ledger = self.repository.load_ledger().await?;
        Ok(TopicStats {
            total_topics: catalog.topic_count(),
            total_published: ledger.articles.len(),
            categories: catalog
                .categories()
                .iter()
                .map(|c| (c.name.clone(), c.topics.len()))
                .collect(),
            cooldown_window: self.cooldown_window,
            topics_in_cooldown: ledger.recent_topics(self.cooldown_window).len(),
        })
    }
}
