//! Bounded retry for AI calls that hit a service overload
//!
//! Only errors for which [`Error::is_transient`] holds are retried. The wait
//! after attempt N is N times the backoff unit and happens after every
//! overloaded attempt, including the final one.

use std::future::Future;
use std::time::Duration;

use crate::config::AiConfig;
use crate::{Error, Result};

/// Something that can pause the run between attempts
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_unit: Duration::from_secs(config.retry_backoff_secs),
        }
    }

    /// Linear backoff: 30s, 60s, 90s with the default unit
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    /// Run `operation` until it succeeds, fails for good, or attempts run out
    pub async fn run<F, Fut, T>(&self, sleeper: &dyn Sleeper, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = delay.as_secs(),
                        "AI service overloaded, backing off"
                    );
                    sleeper.sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, attempt, "Non-retryable AI error");
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::AiProvider("no attempts were made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(60));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_exhausted_overloads_sleep_linearly() {
        let sleeper = RecordingSleeper::default();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = RetryPolicy::default()
            .run(&sleeper, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::AiOverloaded("503".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::AiOverloaded(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.secs(), vec![30, 60, 90]);
    }

    #[tokio::test]
    async fn test_final_error_not_retried() {
        let sleeper = RecordingSleeper::default();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = RetryPolicy::default()
            .run(&sleeper, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::AiProvider("401".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.secs().is_empty());
    }

    #[tokio::test]
    async fn test_recovers_after_overload() {
        let sleeper = RecordingSleeper::default();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = RetryPolicy::default()
            .run(&sleeper, move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::AiOverloaded("busy".to_string()))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(sleeper.secs(), vec![30]);
    }
}
