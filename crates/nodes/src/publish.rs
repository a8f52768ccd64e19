//! Publish orchestrator.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    ArticleResult, PostDraft, PostStatus, PublishError, PublishedPost, PublishingBackend,
    RetrySchedule,
};
use tracing::{info, instrument, warn};

use crate::retry::{run_with_retry, Sleeper};

/// Three attempts, 1 s base delay.
pub const PUBLISH_SCHEDULE: RetrySchedule = RetrySchedule::new(3, Duration::from_secs(1));

const CREDENTIAL_CHECK_TITLE: &str = "[Test] API Connection Test - Please Delete";
const CREDENTIAL_CHECK_CONTENT: &str =
    "<p>This draft was created to verify API credentials. It can be deleted.</p>";
const CREDENTIAL_CHECK_EXCERPT: &str = "Credential check draft.";

/// Creates posts on the publishing backend.
#[derive(Clone)]
pub struct PublishOrchestrator {
    backend: Arc<dyn PublishingBackend>,
    sleeper: Arc<dyn Sleeper>,
    schedule: RetrySchedule,
}

impl PublishOrchestrator {
    pub fn new(backend: Arc<dyn PublishingBackend>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            backend,
            sleeper,
            schedule: PUBLISH_SCHEDULE,
        }
    }

    /// Replaces the default schedule.
    pub fn with_schedule(mut self, schedule: RetrySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Publishes a generated article with the given visibility.
    pub async fn publish(
        &self,
        article: &ArticleResult,
        status: PostStatus,
    ) -> Result<PublishedPost, PublishError> {
        self.create(PostDraft {
            title: article.title.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            status,
        })
        .await
    }

    /// Saves a post without making it visible.
    pub async fn create_draft(
        &self,
        title: &str,
        content: &str,
        excerpt: &str,
    ) -> Result<PublishedPost, PublishError> {
        self.create(PostDraft {
            title: title.to_owned(),
            content: content.to_owned(),
            excerpt: excerpt.to_owned(),
            status: PostStatus::Draft,
        })
        .await
    }

    /// Creates a throw-away draft to prove the credentials can write posts.
    ///
    /// With `delete_after`, the draft is removed again. A failed delete is
    /// only logged; the credentials have already been proven.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn verify_credentials(&self, delete_after: bool) -> Result<PublishedPost, PublishError> {
        let post = self
            .create_draft(
                CREDENTIAL_CHECK_TITLE,
                CREDENTIAL_CHECK_CONTENT,
                CREDENTIAL_CHECK_EXCERPT,
            )
            .await?;
        info!(post_id = %post.id, "credentials verified");

        if delete_after {
            match self.backend.delete_post(post.id).await {
                Ok(()) => info!(post_id = %post.id, "deleted credential check draft"),
                Err(failure) => warn!(
                    post_id = %post.id,
                    error = %failure,
                    "could not delete credential check draft; remove it manually"
                ),
            }
        }
        Ok(post)
    }

    #[instrument(skip(self, draft), fields(backend = self.backend.name(), status = ?draft.status))]
    async fn create(&self, draft: PostDraft) -> Result<PublishedPost, PublishError> {
        let draft = &draft;
        let post = run_with_retry(&self.schedule, self.sleeper.as_ref(), "publish", |_| {
            self.backend.create_post(draft)
        })
        .await
        .map_err(PublishError::from_failure)?;

        info!(post_id = %post.id, url = %post.url, status = %post.status, "post created");
        Ok(post)
    }
}
