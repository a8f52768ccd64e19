//! The attempt loop shared by every orchestrator.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{ProviderFailure, RetryDecision, RetrySchedule};
use tracing::{info, warn};

/// Suspends the current task between attempts.
///
/// Production code uses [`TokioSleeper`]; tests substitute an implementation
/// that records the requested delays and returns immediately.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Runs `op` until it succeeds or `schedule` gives up.
///
/// `op` receives the 1-based attempt number. On give-up the failure of the
/// last attempt is returned unchanged; callers convert it to their typed error.
pub async fn run_with_retry<T, F, Fut>(
    schedule: &RetrySchedule,
    sleeper: &dyn Sleeper,
    call_site: &'static str,
    mut op: F,
) -> Result<T, ProviderFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderFailure>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(call_site, attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(failure) => match schedule.decide(failure.kind, attempt) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        call_site,
                        attempt,
                        max_attempts = schedule.max_attempts,
                        kind = failure.kind.label(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %failure,
                        "call failed; retrying"
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    warn!(
                        call_site,
                        attempt,
                        kind = failure.kind.label(),
                        error = %failure,
                        "giving up"
                    );
                    return Err(failure);
                }
            },
        }
    }
}
