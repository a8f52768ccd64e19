//! `articlegen` entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse the command line** with `clap` and load configuration from the
//!    environment (optionally via `.env`).
//! 2. **Wire observability**: console, JSON log file, and optional OTLP export.
//!    All `tracing` spans and events emitted by every crate flow through here.
//! 3. **Construct infrastructure**: the JSON topic repository and the Tavily,
//!    Anthropic and WordPress adapters, injected into the orchestrators and the
//!    [`nodes::PipelineExecutor`].
//! 4. **Dispatch**: run the pipeline, or one of the maintenance subcommands.
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success (including dry runs) |
//! | 1 | configuration error, interrupt, or unexpected failure |
//! | 2 | topic selection or topic storage error |
//! | 3 | research error |
//! | 4 | generation error |
//! | 5 | publish error |

mod args;
mod config;
mod observability;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use llm::AnthropicProvider;
use nodes::{
    GenerationOrchestrator, PipelineExecutor, PublishOrchestrator, ResearchOrchestrator,
    RunOptions, TokioSleeper,
};
use pipeline::{PipelineError, PipelineRunId, PipelineStage, StoreError, TopicManager};
use publisher::WordPressPublisher;
use research::TavilyProvider;
use store::JsonFileRepository;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, info_span, warn, Instrument};

use crate::args::{Cli, Command};
use crate::config::{load_dotenv, AppConfig, LogLevel, StoreConfig, WordPressConfig};

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_TOPIC_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    ExitCode::from(runtime.block_on(run(cli)))
}

async fn run(cli: Cli) -> u8 {
    load_dotenv();
    let log_level = match LogLevel::from_lookup(|key| std::env::var(key).ok()) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{err}");
            return EXIT_FAILURE;
        }
    };
    let console_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        log_level.as_filter()
    };
    let telemetry = match observability::init(console_level) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("failed to initialise logging: {err:#}");
            return EXIT_FAILURE;
        }
    };

    let code = tokio::select! {
        code = dispatch(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; in-flight stage abandoned");
            EXIT_FAILURE
        }
    };

    telemetry.shutdown().await;
    code
}

async fn dispatch(cli: Cli) -> u8 {
    match cli.command {
        None => {
            let options = RunOptions {
                dry_run: cli.dry_run,
                topic_override: cli.topic.filter(|t| !t.trim().is_empty()),
            };
            run_pipeline(options).await
        }
        Some(Command::Stats) => with_topics(|topics| async move {
            let stats = topics.stats().await?;
            println!(
                "Topics: {} across {} categories",
                stats.total_topics,
                stats.categories.len()
            );
            println!("Published: {}", stats.total_published);
            println!(
                "In cooldown: {} (window of {} publications)",
                stats.topics_in_cooldown, stats.cooldown_window
            );
            for (name, count) in &stats.categories {
                println!("  {name}: {count}");
            }
            Ok(EXIT_OK)
        })
        .await,
        Some(Command::History { limit }) => with_topics(|topics| async move {
            let history = topics.history(limit).await?;
            if history.is_empty() {
                println!("No articles published yet.");
            }
            for record in history {
                println!(
                    "{}  [{}]  {}  {}",
                    record.date, record.category, record.title, record.url
                );
            }
            Ok(EXIT_OK)
        })
        .await,
        Some(Command::Topics) => with_topics(|topics| async move {
            for (topic, category) in topics.all_topics().await? {
                println!("{category}: {topic}");
            }
            Ok(EXIT_OK)
        })
        .await,
        Some(Command::AddTopic {
            category_key,
            topic,
        }) => with_topics(|topics| async move {
            if topics.add_topic(&category_key, &topic).await? {
                println!("Added '{topic}' to {category_key}.");
                Ok(EXIT_OK)
            } else {
                eprintln!("Not added: unknown category '{category_key}' or topic already present.");
                Ok(EXIT_TOPIC_ERROR)
            }
        })
        .await,
        Some(Command::CheckCredentials { keep }) => check_credentials(keep).await,
    }
}

/// One full pipeline run under a root span carrying the run id.
async fn run_pipeline(options: RunOptions) -> u8 {
    let run_id = PipelineRunId::new_random();
    let span = info_span!("article_pipeline", run_id = %run_id);
    async move {
        let config = match AppConfig::from_env() {
            Ok(config) => config,
            Err(err) => return report_failure(&PipelineError::Configuration {
                message: err.to_string(),
            }),
        };
        info!(stage = %PipelineStage::ConfigLoaded, config = ?config);

        let options = RunOptions {
            dry_run: options.dry_run || config.dry_run,
            ..options
        };
        let executor = match build_executor(&config).await {
            Ok(executor) => executor,
            Err(err) => return report_failure(&err),
        };

        match executor.run(run_id, &options).await {
            Ok(report) => {
                if let Some(post) = &report.post {
                    println!("Published: {} ({})", report.article.title, post.url);
                } else {
                    println!("Dry run complete: {}", report.article.title);
                }
                EXIT_OK
            }
            Err(err) => report_failure(&err),
        }
    }
    .instrument(span)
    .await
}

fn report_failure(err: &PipelineError) -> u8 {
    error!(stage = %err.stage(), exit_code = err.exit_code(), "{err}");
    err.exit_code()
}

async fn build_executor(config: &AppConfig) -> Result<PipelineExecutor, PipelineError> {
    let configuration = |what: &str, err: reqwest::Error| PipelineError::Configuration {
        message: format!("could not build the {what} client: {err}"),
    };

    let repository =
        JsonFileRepository::open(&config.store.topics_file, &config.store.published_file)
            .await
            .map_err(|err| PipelineError::Configuration {
                message: format!("could not initialise the topic documents: {err}"),
            })?;
    let research = TavilyProvider::new(config.tavily_api_key.clone())
        .map_err(|e| configuration("research", e))?;
    let generation =
        AnthropicProvider::new(config.anthropic_api_key.clone(), config.anthropic_model.clone())
            .map_err(|e| configuration("generation", e))?;
    let backend = wordpress_backend(&config.wordpress).map_err(|e| configuration("WordPress", e))?;

    let sleeper = Arc::new(TokioSleeper);
    let executor = PipelineExecutor::new(
        TopicManager::new(Arc::new(repository), config.store.topic_cooldown),
        ResearchOrchestrator::new(Arc::new(research), sleeper.clone()),
        GenerationOrchestrator::new(Arc::new(generation), sleeper.clone()),
        PublishOrchestrator::new(Arc::new(backend), sleeper),
    );
    info!(stage = %PipelineStage::ModulesReady, model = %config.anthropic_model);
    Ok(executor)
}

fn wordpress_backend(config: &WordPressConfig) -> Result<WordPressPublisher, reqwest::Error> {
    WordPressPublisher::new(&config.url, config.username.clone(), config.app_password.clone())
}

/// Opens the topic documents and runs `command` against them.
async fn with_topics<F, Fut>(command: F) -> u8
where
    F: FnOnce(TopicManager) -> Fut,
    Fut: std::future::Future<Output = Result<u8, StoreError>>,
{
    let store = match StoreConfig::from_lookup(|key| std::env::var(key).ok()) {
        Ok(store) => store,
        Err(err) => {
            error!("{err}");
            return EXIT_FAILURE;
        }
    };
    let repository = match JsonFileRepository::open(&store.topics_file, &store.published_file).await
    {
        Ok(repository) => repository,
        Err(err) => {
            error!("{err}");
            return EXIT_TOPIC_ERROR;
        }
    };

    match command(TopicManager::new(Arc::new(repository), store.topic_cooldown)).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            EXIT_TOPIC_ERROR
        }
    }
}

async fn check_credentials(keep: bool) -> u8 {
    let config = match WordPressConfig::from_lookup(|key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return EXIT_FAILURE;
        }
    };
    let backend = match wordpress_backend(&config) {
        Ok(backend) => backend,
        Err(err) => {
            error!("could not build the WordPress client: {err}");
            return EXIT_FAILURE;
        }
    };

    let publish = PublishOrchestrator::new(Arc::new(backend), Arc::new(TokioSleeper));
    match publish.verify_credentials(!keep).await {
        Ok(post) => {
            println!("Credentials OK for {} (draft post {}).", config.url, post.id);
            if keep {
                println!("Draft kept: {}", post.url);
            }
            EXIT_OK
        }
        Err(err) => report_failure(&PipelineError::Publish(err)),
    }
}
