//! Research orchestrator.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{ResearchError, ResearchProvider, ResearchResult, RetrySchedule, SearchRequest};
use tracing::{info, instrument};

use crate::retry::{run_with_retry, Sleeper};

/// Three attempts, 2 s base delay for every retryable kind.
pub const RESEARCH_SCHEDULE: RetrySchedule = RetrySchedule::new(3, Duration::from_secs(2));

/// Sources requested per search.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Gathers web sources about a topic, retrying transient failures.
#[derive(Clone)]
pub struct ResearchOrchestrator {
    provider: Arc<dyn ResearchProvider>,
    sleeper: Arc<dyn Sleeper>,
    schedule: RetrySchedule,
}

impl ResearchOrchestrator {
    pub fn new(provider: Arc<dyn ResearchProvider>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            provider,
            sleeper,
            schedule: RESEARCH_SCHEDULE,
        }
    }

    /// Replaces the default schedule.
    pub fn with_schedule(mut self, schedule: RetrySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn research(&self, topic: &str) -> Result<ResearchResult, ResearchError> {
        let request = SearchRequest {
            query: format!("{topic} Parga Greece"),
            max_results: MAX_SEARCH_RESULTS,
        };

        let response = run_with_retry(&self.schedule, self.sleeper.as_ref(), "research", |_| {
            self.provider.search(&request)
        })
        .await
        .map_err(ResearchError::from_failure)?;

        let result = ResearchResult::new(topic, response);
        info!(
            sources = result.sources.len(),
            has_summary = result.summary.is_some(),
            "research complete"
        );
        Ok(result)
    }
}
