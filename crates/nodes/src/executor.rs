//! The pipeline executor: one run from topic selection to ledger entry.
//!
//! Stages run strictly in order:
//!
//! ```text
//! TopicSelected → Researched → Generated → Published → Logged → Done
//! ```
//!
//! The first failing stage stops the run and is reported as the matching
//! [`PipelineError`] variant. The single exception is `Logged`: the post is
//! already live by then, so a ledger write failure is logged as a warning and
//! the run still succeeds. A dry run stops after `Generated`.

use std::time::Instant;

use pipeline::{
    ArticleResult, PipelineError, PipelineRunId, PipelineStage, PostStatus, PublishedPost,
    TopicManager,
};
use tracing::{info, instrument, warn};

use crate::generation::GenerationOrchestrator;
use crate::publish::PublishOrchestrator;
use crate::research::ResearchOrchestrator;

/// Category reported for an operator-supplied topic.
pub const CUSTOM_CATEGORY: &str = "Custom";

/// Per-run switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Generate but do not publish or log.
    pub dry_run: bool,
    /// Use this topic instead of asking the selector.
    pub topic_override: Option<String>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: PipelineRunId,
    pub topic: String,
    pub category: String,
    pub article: ArticleResult,
    /// `None` for a dry run.
    pub post: Option<PublishedPost>,
    /// Whether the publication reached the ledger.
    pub logged: bool,
    /// Last stage reached.
    pub stage: PipelineStage,
}

/// Drives a single pipeline run.
#[derive(Clone)]
pub struct PipelineExecutor {
    topics: TopicManager,
    research: ResearchOrchestrator,
    generation: GenerationOrchestrator,
    publish: PublishOrchestrator,
}

impl PipelineExecutor {
    pub fn new(
        topics: TopicManager,
        research: ResearchOrchestrator,
        generation: GenerationOrchestrator,
        publish: PublishOrchestrator,
    ) -> Self {
        Self {
            topics,
            research,
            generation,
            publish,
        }
    }

    #[instrument(
        name = "pipeline_run",
        skip(self, options),
        fields(run_id = %run_id, dry_run = options.dry_run)
    )]
    pub async fn run(
        &self,
        run_id: PipelineRunId,
        options: &RunOptions,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        info!(stage = %PipelineStage::ModulesReady, "starting article pipeline");

        let (topic, category, overridden) = match &options.topic_override {
            Some(topic) => {
                info!(topic = %topic, "using topic override");
                (topic.clone(), CUSTOM_CATEGORY.to_owned(), true)
            }
            None => {
                let selection = self.topics.next_topic().await?;
                (selection.topic, selection.category_name, false)
            }
        };
        info!(stage = %PipelineStage::TopicSelected, topic = %topic, category = %category);

        let research = self.research.research(&topic).await?;
        info!(stage = %PipelineStage::Researched, sources = research.sources.len());

        let article = self.generation.generate(&topic, &research).await?;
        info!(stage = %PipelineStage::Generated, title = %article.title);

        if options.dry_run {
            info!(
                title = %article.title,
                excerpt = %article.excerpt,
                word_count = article.word_count,
                keywords = %article.keywords.join(", "),
                "dry run: skipping publication"
            );
            info!(
                elapsed_ms = elapsed_ms(started),
                stage = %PipelineStage::Done,
                "pipeline completed (dry run)"
            );
            return Ok(RunReport {
                run_id,
                topic,
                category,
                article,
                post: None,
                logged: false,
                stage: PipelineStage::Generated,
            });
        }

        let post = self.publish.publish(&article, PostStatus::Publish).await?;
        info!(stage = %PipelineStage::Published, post_id = %post.id, url = %post.url);

        // An override is logged without a category so the catalog can resolve it.
        let logged_category = (!overridden).then_some(category.as_str());
        let logged = match self
            .topics
            .record_publication(&topic, &article.title, &post.url, logged_category)
            .await
        {
            Ok(_) => {
                info!(stage = %PipelineStage::Logged);
                true
            }
            Err(err) => {
                warn!(error = %err, url = %post.url, "failed to log publication; post is live");
                false
            }
        };

        info!(
            elapsed_ms = elapsed_ms(started),
            stage = %PipelineStage::Done,
            title = %article.title,
            url = %post.url,
            "pipeline completed"
        );
        Ok(RunReport {
            run_id,
            topic,
            category,
            article,
            post: Some(post),
            logged,
            stage: PipelineStage::Done,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
