//! Honeypot inspection and submission cooldown

pub mod rate_limit;

pub use rate_limit::RateLimitState;

use crate::models::ContactFormInput;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    Honeypot,
    RateLimited { retry_after: Duration },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Honeypot => write!(f, "honeypot field was filled"),
            RejectionReason::RateLimited { retry_after } => {
                write!(f, "cooldown active, {}s remaining", retry_after.as_secs())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Rejected(RejectionReason),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allowed)
    }
}

#[derive(Debug, Clone)]
pub struct SpamGuard {
    cooldown: Duration,
    rate_limit: RateLimitState,
}

impl SpamGuard {
    pub fn new(cooldown: Duration, rate_limit: RateLimitState) -> Self {
        Self { cooldown, rate_limit }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn rate_limit_state(&self) -> &RateLimitState {
        &self.rate_limit
    }

    /// Honeypot first, then the cooldown window. Never mutates the rate-limit state.
    pub fn check(&self, input: &ContactFormInput, now: DateTime<Utc>) -> GuardDecision {
        if !input.honeypot.trim().is_empty() {
            return GuardDecision::Rejected(RejectionReason::Honeypot);
        }

        if let Some(last) = self.rate_limit.last_accepted_at() {
            // A clock that moved backwards counts as no time elapsed.
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);

            if elapsed < self.cooldown {
                return GuardDecision::Rejected(RejectionReason::RateLimited {
                    retry_after: self.cooldown - elapsed,
                });
            }
        }

        GuardDecision::Allowed
    }
}
