//! Generation orchestrator.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    extract_payload, ArticleResult, CompletionRequest, GenerationError, GenerationProvider,
    ResearchResult, RetrySchedule,
};
use tracing::{debug, info, instrument};

use crate::prompts::{article_prompt, SYSTEM_PROMPT};
use crate::retry::{run_with_retry, Sleeper};

/// Three attempts; 2 s base delay, 10 s for rate limits.
pub const GENERATION_SCHEDULE: RetrySchedule = RetrySchedule::new(3, Duration::from_secs(2))
    .with_rate_limit_base_delay(Duration::from_secs(10));

/// Output token cap per completion.
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Drafts an article from a topic and its research.
///
/// Payload extraction happens inside the attempt, so a completion that does
/// not contain a valid article object is re-requested like a transient
/// failure.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    sleeper: Arc<dyn Sleeper>,
    schedule: RetrySchedule,
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn GenerationProvider>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            provider,
            sleeper,
            schedule: GENERATION_SCHEDULE,
        }
    }

    /// Replaces the default schedule.
    pub fn with_schedule(mut self, schedule: RetrySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[instrument(skip(self, research), fields(provider = self.provider.name()))]
    pub async fn generate(
        &self,
        topic: &str,
        research: &ResearchResult,
    ) -> Result<ArticleResult, GenerationError> {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_owned(),
            prompt: article_prompt(topic, research),
            max_tokens: MAX_OUTPUT_TOKENS,
        };
        debug!(prompt_chars = request.prompt.len(), "prompt built");

        let request = &request;
        let article = run_with_retry(
            &self.schedule,
            self.sleeper.as_ref(),
            "generation",
            |attempt| async move {
                let completion = self.provider.complete(request).await?;
                info!(
                    attempt,
                    input_tokens = completion.input_tokens.as_u64(),
                    output_tokens = completion.output_tokens.as_u64(),
                    "completion received"
                );
                let payload = extract_payload(&completion.text)?;
                Ok(ArticleResult::from_payload(payload, completion.total_tokens()))
            },
        )
        .await
        .map_err(GenerationError::from_failure)?;

        info!(
            title = %article.title,
            word_count = article.word_count,
            tokens = article.tokens_used.as_u64(),
            "article generated"
        );
        Ok(article)
    }
}
