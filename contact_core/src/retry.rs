//! Bounded retry around relay dispatches

use crate::config::SubmissionConfig;
use crate::dispatch::DispatchOutcome;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    None,
    Fixed,
    Exponential,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    strategy: BackoffStrategy,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Retries immediately, with no delay between attempts. Zero is treated as one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            strategy: BackoffStrategy::None,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn with_fixed_delay(mut self, delay: Duration) -> Self {
        self.strategy = BackoffStrategy::Fixed;
        self.base_delay = delay;
        self.max_delay = delay;
        self
    }

    pub fn with_exponential_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.strategy = BackoffStrategy::Exponential;
        self.base_delay = initial;
        self.max_delay = max.max(initial);
        self
    }

    pub fn from_config(config: &SubmissionConfig) -> Self {
        let policy = Self::new(config.max_attempts);
        let delay = Duration::from_millis(config.retry_delay_ms);

        match config.backoff {
            BackoffStrategy::None => policy,
            BackoffStrategy::Fixed => policy.with_fixed_delay(delay),
            BackoffStrategy::Exponential => policy
                .with_exponential_backoff(delay, Duration::from_millis(config.max_retry_delay_ms)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the attempt following `failed_attempt` (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::None => Duration::ZERO,
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let exponent = failed_attempt.saturating_sub(1).min(16);
                self.base_delay
                    .saturating_mul(1u32 << exponent)
                    .min(self.max_delay)
            }
        }
    }

    /// Longest a full run can take when each attempt may use up to `per_attempt`.
    pub fn worst_case_duration(&self, per_attempt: Duration) -> Duration {
        let waits: Duration = (1..self.max_attempts).map(|n| self.delay_after(n)).sum();
        per_attempt.saturating_mul(self.max_attempts) + waits
    }

    /// Calls `attempt` with the 1-based attempt number until it returns something
    /// other than a transient failure or the attempt budget is spent.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> DispatchOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = DispatchOutcome>,
    {
        let mut attempt_number = 1;

        loop {
            let outcome = attempt(attempt_number).await;

            match &outcome {
                DispatchOutcome::TransientFailure { cause } if attempt_number < self.max_attempts => {
                    let delay = self.delay_after(attempt_number);
                    warn!(
                        attempt = attempt_number,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        cause = %cause,
                        "Transient dispatch failure, retrying"
                    );

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt_number += 1;
                }
                DispatchOutcome::TransientFailure { cause } => {
                    warn!(
                        attempts = attempt_number,
                        cause = %cause,
                        "Dispatch retries exhausted"
                    );
                    return outcome;
                }
                _ => {
                    debug!(attempts = attempt_number, "Dispatch finished");
                    return outcome;
                }
            }
        }
    }
}

/// Runs `attempt` up to `max_attempts` times without delays.
pub async fn with_retry<F, Fut>(attempt: F, max_attempts: u32) -> DispatchOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DispatchOutcome>,
{
    RetryPolicy::new(max_attempts).run(attempt).await
}
