#![allow(async_fn_in_trait)]

use std::future::Future;

use serde::Deserialize;

use crate::core::time::Duration;
use crate::observability;

pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration.into()).await;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_max_delay_secs() -> u64 {
    300
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Upper bound for any delay read from configuration.
pub const MAX_CONFIGURED_DELAY_SECS: u64 = 24 * 60 * 60;

/// Converts a configured number of seconds into a [`Duration`], capped at one day.
pub fn configured_delay(secs: u64) -> Duration {
    if secs > MAX_CONFIGURED_DELAY_SECS {
        tracing::warn!("Configured delay of {}s exceeds {}s, capping", secs, MAX_CONFIGURED_DELAY_SECS);
    }

    Duration::seconds(secs.min(MAX_CONFIGURED_DELAY_SECS) as i64)
}

impl RetryPolicy {
    //a policy of zero retries still runs the operation once
    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: 0,
            base_delay,
            max_delay,
        }
    }

    /// `base_delay * 2^attempts`, capped at `max_delay`.
    pub fn next_delay(&self) -> Duration {
        let base = self.base_delay.as_millis();
        let multiplier = 2i64.saturating_pow(self.attempts.min(31));
        let delay = base.saturating_mul(multiplier).min(self.max_delay.as_millis());
        Duration::millis(delay)
    }

    pub fn bump(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }
}

/// Runs fallible operations with bounded retries and exponential backoff.
///
/// Exhausting all attempts yields `None` instead of the last error. Every failed attempt is
/// logged and counted, so callers only decide what "no result" means for them.
#[derive(Debug, Clone)]
pub struct RetryExecutor<S> {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    sleeper: S,
}

impl<S: Sleeper> RetryExecutor<S> {
    pub fn new(policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            max_attempts: policy.attempts(),
            initial_delay: configured_delay(policy.initial_delay_secs),
            max_delay: configured_delay(policy.max_delay_secs),
            sleeper,
        }
    }

    pub async fn execute<T, F, Fut>(&self, operation: &str, mut action: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = self.max_attempts;
        let mut backoff = ExponentialBackoff::new(self.initial_delay, self.max_delay);

        for attempt in 1..=max_attempts {
            match action().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {} of {}", operation, attempt, max_attempts);
                    }
                    return Some(value);
                }
                Err(e) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        "Attempt {} of {} failed: {:?}",
                        attempt,
                        max_attempts,
                        e
                    );
                    observability::retry_attempt_failed(operation);

                    if attempt < max_attempts {
                        let delay = backoff.next_delay();
                        backoff.bump();
                        tracing::debug!("Retrying {} in {}", operation, delay);
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        tracing::error!(operation, "Max retries reached, giving up after {} attempts", max_attempts);
        observability::retry_exhausted(operation);
        None
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::testing::RecordingSleeper;
    use super::*;

    fn executor(sleeper: &RecordingSleeper) -> RetryExecutor<RecordingSleeper> {
        RetryExecutor::new(RetryPolicy::default(), sleeper.clone())
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let mut backoff = ExponentialBackoff::new(Duration::seconds(5), Duration::seconds(30));

        let mut delays = vec![];
        for _ in 0..5 {
            delays.push(backoff.next_delay());
            backoff.bump();
        }

        assert_eq!(
            delays,
            vec![
                Duration::seconds(5),
                Duration::seconds(10),
                Duration::seconds(20),
                Duration::seconds(30),
                Duration::seconds(30),
            ]
        );
    }

    #[tokio::test]
    async fn first_success_does_not_sleep() {
        let sleeper = RecordingSleeper::default();

        let result = executor(&sleeper).execute("op", || async { Ok(42) }).await;

        assert_eq!(result, Some(42));
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_doubling_delays() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let result = executor(&sleeper)
            .execute("op", || {
                calls.set(calls.get() + 1);
                let call = calls.get();
                async move {
                    if call < 3 {
                        anyhow::bail!("failure {}", call)
                    }
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result, Some("done"));
        assert_eq!(calls.get(), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::seconds(5), Duration::seconds(10)]);
    }

    #[tokio::test]
    async fn exhausted_retries_yield_none() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let result: Option<()> = executor(&sleeper)
            .execute("op", || {
                calls.set(calls.get() + 1);
                async { Err(anyhow::anyhow!("unreachable service")) }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.get(), 3);
        //no sleep after the last attempt
        assert_eq!(sleeper.sleeps(), vec![Duration::seconds(5), Duration::seconds(10)]);
    }

    #[tokio::test]
    async fn oversized_configured_delays_are_capped() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay_secs: u64::MAX,
            max_delay_secs: u64::MAX,
        };

        let result: Option<()> = RetryExecutor::new(policy, sleeper.clone())
            .execute("op", || async { Err(anyhow::anyhow!("down")) })
            .await;

        assert_eq!(result, None);
        assert_eq!(sleeper.sleeps(), vec![Duration::seconds(86_400), Duration::seconds(86_400)]);
    }

    #[test]
    fn configured_delay_within_bounds_is_kept() {
        assert_eq!(configured_delay(30), Duration::seconds(30));
        assert_eq!(configured_delay(i64::MAX as u64 + 1), Duration::seconds(86_400));
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let calls = Cell::new(0);

        let result: Option<()> = RetryExecutor::new(policy, sleeper.clone())
            .execute("op", || {
                calls.set(calls.get() + 1);
                async { Err(anyhow::anyhow!("down")) }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.get(), 1);
        assert!(sleeper.sleeps().is_empty());
    }
}
