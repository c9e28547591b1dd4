//! Submission controller: runs validation, the spam guard and the retried dispatch
//! for one form instance, and tracks what the form should show.

pub mod state;

pub use state::{DispatchFailure, FailureKind, SubmissionOutcome, SubmissionState};

use crate::dispatch::{DispatchAdapter, DispatchOutcome};
use crate::models::ContactFormInput;
use crate::retry::RetryPolicy;
use crate::spam::{GuardDecision, RateLimitState, SpamGuard};
use crate::validation;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a submission is already in progress")]
    AlreadySubmitting,

    #[error("the form has been disposed")]
    Disposed,
}

struct Lifecycle {
    state: SubmissionState,
    generation: u64,
    disposed: bool,
    draft: ContactFormInput,
}

struct ControllerInner {
    guard: SpamGuard,
    retry: RetryPolicy,
    adapter: Arc<DispatchAdapter>,
    rate_limit: RateLimitState,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<SubmissionState>,
}

impl ControllerInner {
    fn publish(&self, lifecycle: &mut Lifecycle, state: SubmissionState) {
        lifecycle.state = state.clone();
        self.state_tx.send_replace(state);
    }
}

/// One form instance. Clones share the same state.
#[derive(Clone)]
pub struct SubmissionController {
    inner: Arc<ControllerInner>,
}

/// Marks one in-flight submission. Dropping it before completion returns the
/// form to `Idle`, unless the controller was disposed in the meantime.
struct InFlight {
    inner: Arc<ControllerInner>,
    generation: u64,
    completed: bool,
}

impl InFlight {
    fn complete(mut self, outcome: &SubmissionOutcome) {
        self.completed = true;

        let mut lifecycle = self.inner.lifecycle.lock();
        if lifecycle.disposed || lifecycle.generation != self.generation {
            debug!(generation = self.generation, "Discarding result for a stale submission");
            return;
        }

        if outcome.is_success() {
            lifecycle.draft = ContactFormInput::default();
        }
        self.inner.publish(&mut lifecycle, outcome.to_state());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let mut lifecycle = self.inner.lifecycle.lock();
        if !lifecycle.disposed
            && lifecycle.generation == self.generation
            && lifecycle.state.is_submitting()
        {
            warn!(generation = self.generation, "Submission abandoned before completion");
            self.inner.publish(&mut lifecycle, SubmissionState::Idle);
        }
    }
}

impl SubmissionController {
    /// The guard's rate-limit state is the one this controller records accepted submissions in.
    pub fn new(adapter: Arc<DispatchAdapter>, retry: RetryPolicy, guard: SpamGuard) -> Self {
        let rate_limit = guard.rate_limit_state().clone();
        let (state_tx, _) = watch::channel(SubmissionState::Idle);

        Self {
            inner: Arc::new(ControllerInner {
                guard,
                retry,
                adapter,
                rate_limit,
                lifecycle: Mutex::new(Lifecycle {
                    state: SubmissionState::Idle,
                    generation: 0,
                    disposed: false,
                    draft: ContactFormInput::default(),
                }),
                state_tx,
            }),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.lifecycle.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.inner.rate_limit
    }

    pub fn draft(&self) -> ContactFormInput {
        self.inner.lifecycle.lock().draft.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.lifecycle.lock().state.is_submitting()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lifecycle.lock().disposed
    }

    /// Stores the visitor's current fields. Editing after a finished submission
    /// puts the form back to `Idle`.
    pub fn edit(&self, input: ContactFormInput) {
        let mut lifecycle = self.inner.lifecycle.lock();
        if lifecycle.disposed {
            return;
        }

        lifecycle.draft = input;
        if lifecycle.state.is_terminal() {
            self.inner.publish(&mut lifecycle, SubmissionState::Idle);
        }
    }

    pub fn reset(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();
        if lifecycle.disposed || lifecycle.state.is_submitting() {
            return;
        }

        lifecycle.draft = ContactFormInput::default();
        self.inner.publish(&mut lifecycle, SubmissionState::Idle);
    }

    /// Detaches the form. Submissions still in flight finish without writing any state.
    pub fn dispose(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();
        lifecycle.disposed = true;
        lifecycle.generation += 1;
    }

    pub async fn submit_draft(&self) -> Result<SubmissionOutcome, ControllerError> {
        let input = self.draft();
        self.submit(input).await
    }

    pub async fn submit(&self, input: ContactFormInput) -> Result<SubmissionOutcome, ControllerError> {
        self.submit_at(input, Utc::now()).await
    }

    /// Runs one submission stamped with `now`. A second call while one is in
    /// flight returns [`ControllerError::AlreadySubmitting`] and changes nothing.
    pub async fn submit_at(
        &self,
        input: ContactFormInput,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, ControllerError> {
        let ticket = self.begin(&input)?;

        let outcome = self.run_pipeline(&input, now).await;

        ticket.complete(&outcome);
        Ok(outcome)
    }

    fn begin(&self, input: &ContactFormInput) -> Result<InFlight, ControllerError> {
        let mut lifecycle = self.inner.lifecycle.lock();

        if lifecycle.disposed {
            return Err(ControllerError::Disposed);
        }
        if lifecycle.state.is_submitting() {
            debug!("Ignoring submit while a submission is in flight");
            return Err(ControllerError::AlreadySubmitting);
        }

        lifecycle.generation += 1;
        lifecycle.draft = input.clone();
        self.inner.publish(&mut lifecycle, SubmissionState::Submitting);

        Ok(InFlight {
            inner: self.inner.clone(),
            generation: lifecycle.generation,
            completed: false,
        })
    }

    async fn run_pipeline(&self, input: &ContactFormInput, now: DateTime<Utc>) -> SubmissionOutcome {
        let contact = match validation::validate(input) {
            Ok(contact) => contact,
            Err(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                info!(fields = ?fields, "Contact submission failed validation");
                return SubmissionOutcome::ValidationFailed { errors };
            }
        };

        if let GuardDecision::Rejected(reason) = self.inner.guard.check(input, now) {
            warn!(reason = %reason, "Contact submission rejected by spam guard");
            return SubmissionOutcome::RejectedAsSpam { reason };
        }

        let adapter = &self.inner.adapter;
        let contact = &contact;
        let outcome = self
            .inner
            .retry
            .run(move |attempt| {
                debug!(attempt, "Dispatching contact message");
                adapter.send_at(contact, now)
            })
            .await;

        match outcome {
            DispatchOutcome::Success { id } => {
                self.inner.rate_limit.record_accepted(now);
                info!(dispatch_id = %id, service = contact.service().slug(), "Contact submission delivered");
                SubmissionOutcome::Success { dispatch_id: id }
            }
            DispatchOutcome::TransientFailure { cause } => {
                warn!(cause = %cause, "Contact submission failed after retries");
                SubmissionOutcome::DispatchFailed {
                    reason: DispatchFailure {
                        kind: FailureKind::Transient,
                        cause,
                    },
                }
            }
            DispatchOutcome::PermanentFailure { cause } => {
                warn!(cause = %cause, "Contact submission failed permanently");
                SubmissionOutcome::DispatchFailed {
                    reason: DispatchFailure {
                        kind: FailureKind::Permanent,
                        cause,
                    },
                }
            }
        }
    }
}
