//! Per-session record of the last accepted submission

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared between a session's [`super::SpamGuard`] and its
/// [`crate::controller::SubmissionController`]. Cloning shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    last_accepted: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_accepted_at(&self) -> Option<DateTime<Utc>> {
        *self.last_accepted.lock()
    }

    /// Only called once a dispatch has been confirmed.
    pub(crate) fn record_accepted(&self, at: DateTime<Utc>) {
        *self.last_accepted.lock() = Some(at);
    }
}
