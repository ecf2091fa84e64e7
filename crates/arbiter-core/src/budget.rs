//! Time-budget bookkeeping and retry helpers
//!
//! Every provider and shared-cache call in the pipeline is a suspension
//! point and must be wrapped with an explicit timeout. `TimeBudget`
//! tracks how much of a request's overall deadline remains so later
//! stages shrink their bounds as earlier stages consume time.

use std::time::{Duration, Instant};

use rand::Rng;

/// Tracks elapsed time against a fixed overall deadline
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    total: Duration,
}

impl TimeBudget {
    /// Start a budget of `total` from now
    pub fn start(total: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }

    /// Time consumed since the budget started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline, zero once exhausted
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.started.elapsed())
    }

    /// Remaining time, but never less than `floor`
    ///
    /// Late stages still get a minimum slice so a slow retrieval cannot
    /// starve generation down to a zero-length timeout.
    pub fn remaining_or_floor(&self, floor: Duration) -> Duration {
        self.remaining().max(floor)
    }

    /// Whether the deadline has passed
    pub fn exhausted(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Bounded retry with exponential backoff and jitter
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts are exhausted
    ///
    /// Returns the last error when every attempt fails. Jitter spreads
    /// concurrent retries so they do not re-converge on the backend.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.base_delay;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt == self.max_attempts => return Err(e),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "retrying after backoff");
                    let jitter = rand::rng().random_range(0..=delay.as_millis() as u64 / 2);
                    tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                    delay *= 2;
                }
            }
        }

        unreachable!("loop returns on final attempt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_shrinks_and_floors() {
        let budget = TimeBudget::start(Duration::from_millis(100));
        assert!(budget.remaining() <= Duration::from_millis(100));
        assert_eq!(
            budget.remaining_or_floor(Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn zero_budget_is_exhausted() {
        let budget = TimeBudget::start(Duration::ZERO);
        assert!(budget.exhausted());
        assert_eq!(budget.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };

        let mut calls = 0;
        let result: Result<u32, String> = policy
            .run(|| {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 3 {
                        Err("transient".to_owned())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn retry_returns_last_error_when_exhausted() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        };

        let result: Result<(), String> = policy.run(|| async { Err("down".to_owned()) }).await;
        assert_eq!(result.unwrap_err(), "down");
    }
}
