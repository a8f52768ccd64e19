//! Pipeline orchestration.
//!
//! This crate provides the three call orchestrators (research, generation,
//! publish), the retry loop they share, and the [`PipelineExecutor`] that
//! drives one run through its stages.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Orchestrators sequence calls between business
//! logic in the [`pipeline`] crate and the infrastructure ports (research,
//! generation, publishing, topic storage). They contain no domain rules of
//! their own: classification lives in the adapters, retry tuning in
//! [`pipeline::RetrySchedule`].
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`retry`] | `Sleeper` port and the shared attempt loop |
//! | [`research`] | Web research with back-off |
//! | [`generation`] | Prompt building, completion, payload extraction |
//! | [`publish`] | Post creation, drafts, credential check |
//! | [`executor`] | Stage sequencing and the run report |

pub mod executor;
pub mod generation;
pub mod prompts;
pub mod publish;
pub mod research;
pub mod retry;

pub use executor::{PipelineExecutor, RunOptions, RunReport, CUSTOM_CATEGORY};
pub use generation::{GenerationOrchestrator, GENERATION_SCHEDULE, MAX_OUTPUT_TOKENS};
pub use publish::{PublishOrchestrator, PUBLISH_SCHEDULE};
pub use research::{ResearchOrchestrator, MAX_SEARCH_RESULTS, RESEARCH_SCHEDULE};
pub use retry::{run_with_retry, Sleeper, TokioSleeper};
