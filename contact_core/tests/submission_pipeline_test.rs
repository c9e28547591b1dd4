use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use contact_core::{
    config::{BusinessConfig, RelayConfig},
    controller::state::{NOT_ACCEPTED_MESSAGE, PERMANENT_FAILURE_MESSAGE, TRANSIENT_FAILURE_MESSAGE},
    dispatch::{RelayError, RelayRequest, RelayResponse},
    models::ContactFormInput,
    ControllerError, DispatchAdapter, EmailRelay, RateLimitState, RejectionReason, RetryPolicy,
    SpamGuard, SubmissionController, SubmissionOutcome, SubmissionState,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct CountingRelay {
    calls: AtomicU32,
    status: u16,
}

impl CountingRelay {
    fn replying(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            status,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailRelay for CountingRelay {
    async fn send(&self, _request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RelayResponse::new(self.status, "stub"))
    }
}

/// Holds every call until released, so a submission can be observed mid-flight.
struct GatedRelay {
    calls: AtomicU32,
    entered: Notify,
    release: Notify,
}

impl GatedRelay {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl EmailRelay for GatedRelay {
    async fn send(&self, _request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(RelayResponse::ok())
    }
}

fn controller(relay: Arc<dyn EmailRelay>, max_attempts: u32) -> SubmissionController {
    let adapter = Arc::new(DispatchAdapter::new(
        relay,
        RelayConfig::new("service_test", "template_test", "public_test"),
        BusinessConfig::default(),
    ));
    let guard = SpamGuard::new(Duration::from_secs(60), RateLimitState::new());

    SubmissionController::new(adapter, RetryPolicy::new(max_attempts), guard)
}

fn valid_input() -> ContactFormInput {
    ContactFormInput::new(
        "John Doe",
        "john@example.com",
        "5551234567",
        "lawn-care",
        "Please give me a quote",
    )
}

#[tokio::test]
async fn test_happy_path_records_acceptance() {
    let relay = CountingRelay::replying(200);
    let controller = controller(relay.clone(), 3);
    let submitted_at = Utc.with_ymd_and_hms(2026, 5, 4, 15, 30, 0).unwrap();

    let outcome = controller.submit_at(valid_input(), submitted_at).await.unwrap();

    assert!(outcome.is_success());
    assert!(matches!(controller.state(), SubmissionState::Success { .. }));
    assert_eq!(relay.calls(), 1);
    assert_eq!(controller.rate_limit().last_accepted_at(), Some(submitted_at));
}

#[tokio::test]
async fn test_validation_reports_every_field_without_dispatch() {
    let relay = CountingRelay::replying(200);
    let controller = controller(relay.clone(), 3);

    let outcome = controller.submit(ContactFormInput::default()).await.unwrap();

    let fields: Vec<&str> = outcome.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "email", "phone", "serviceInterest", "message"]);
    assert_eq!(relay.calls(), 0);
    assert!(controller.rate_limit().last_accepted_at().is_none());

    match controller.state() {
        SubmissionState::Error { field_errors, .. } => assert_eq!(field_errors.len(), 5),
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn test_honeypot_never_reaches_relay() {
    let relay = CountingRelay::replying(200);
    let controller = controller(relay.clone(), 3);

    let outcome = controller
        .submit(valid_input().with_honeypot("http://buy-now.example"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::RejectedAsSpam {
            reason: RejectionReason::Honeypot
        }
    );
    assert_eq!(outcome.user_message(), NOT_ACCEPTED_MESSAGE);
    assert_eq!(relay.calls(), 0);
}

#[tokio::test]
async fn test_second_submission_inside_cooldown_is_rejected() {
    let relay = CountingRelay::replying(200);
    let controller = controller(relay.clone(), 3);
    let first_at = Utc::now();

    let first = controller.submit_at(valid_input(), first_at).await.unwrap();
    assert!(first.is_success());

    let second = controller
        .submit_at(valid_input(), first_at + ChronoDuration::seconds(1))
        .await
        .unwrap();

    match &second {
        SubmissionOutcome::RejectedAsSpam {
            reason: RejectionReason::RateLimited { retry_after },
        } => assert_eq!(*retry_after, Duration::from_secs(59)),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(second.user_message(), NOT_ACCEPTED_MESSAGE);
    assert_eq!(relay.calls(), 1);

    let later = controller
        .submit_at(valid_input(), first_at + ChronoDuration::seconds(61))
        .await
        .unwrap();
    assert!(later.is_success());
    assert_eq!(relay.calls(), 2);
}

#[tokio::test]
async fn test_transient_failures_exhaust_attempts() {
    let relay = CountingRelay::replying(503);
    let controller = controller(relay.clone(), 3);

    let outcome = controller.submit(valid_input()).await.unwrap();

    assert_eq!(relay.calls(), 3);
    assert_eq!(outcome.user_message(), TRANSIENT_FAILURE_MESSAGE);
    assert!(controller.rate_limit().last_accepted_at().is_none());
    match controller.state() {
        SubmissionState::Error { message, .. } => assert_eq!(message, TRANSIENT_FAILURE_MESSAGE),
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let relay = CountingRelay::replying(401);
    let controller = controller(relay.clone(), 3);

    let outcome = controller.submit(valid_input()).await.unwrap();

    assert_eq!(relay.calls(), 1);
    assert_eq!(outcome.user_message(), PERMANENT_FAILURE_MESSAGE);
    assert!(outcome.user_message().contains("call us directly"));
}

#[tokio::test]
async fn test_failed_dispatch_leaves_visitor_free_to_retry() {
    let failing = controller(CountingRelay::replying(500), 1);
    failing.submit(valid_input()).await.unwrap();

    assert!(failing.rate_limit().last_accepted_at().is_none());

    let outcome = failing.submit(valid_input()).await.unwrap();
    assert!(!matches!(outcome, SubmissionOutcome::RejectedAsSpam { .. }));
}

#[tokio::test]
async fn test_double_submit_while_in_flight() {
    let relay = GatedRelay::new();
    let controller = controller(relay.clone(), 3);

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit(valid_input()).await }
    });

    relay.entered.notified().await;
    assert!(controller.state().is_submitting());

    let second = controller.submit(valid_input()).await;
    assert_eq!(second, Err(ControllerError::AlreadySubmitting));
    assert!(controller.state().is_submitting());

    relay.release.notify_one();
    let outcome = first.await.unwrap().unwrap();

    assert!(outcome.is_success());
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disposed_controller_ignores_late_result() {
    let relay = GatedRelay::new();
    let controller = controller(relay.clone(), 3);
    let mut states = controller.subscribe();

    let in_flight = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit(valid_input()).await }
    });

    relay.entered.notified().await;
    controller.dispose();
    states.borrow_and_update();

    relay.release.notify_one();
    in_flight.await.unwrap().unwrap();

    assert!(!matches!(controller.state(), SubmissionState::Success { .. }));
    assert!(!states.has_changed().unwrap_or(false));
    assert_eq!(
        controller.submit(valid_input()).await,
        Err(ControllerError::Disposed)
    );
}

#[tokio::test]
async fn test_abandoned_submission_returns_to_idle() {
    let relay = GatedRelay::new();
    let controller = controller(relay.clone(), 3);

    let in_flight = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit(valid_input()).await }
    });

    relay.entered.notified().await;
    in_flight.abort();
    assert!(in_flight.await.unwrap_err().is_cancelled());

    assert_eq!(controller.state(), SubmissionState::Idle);
    assert!(controller.rate_limit().last_accepted_at().is_none());
}

#[tokio::test]
async fn test_success_clears_draft_and_edit_resets_state() {
    let controller = controller(CountingRelay::replying(200), 3);

    controller.edit(valid_input());
    assert_eq!(controller.draft(), valid_input());

    let outcome = controller.submit_draft().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(controller.draft(), ContactFormInput::default());

    controller.edit(ContactFormInput::default());
    assert_eq!(controller.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_error_state_survives_until_reset() {
    let controller = controller(CountingRelay::replying(200), 3);
    let mut states = controller.subscribe();

    controller.submit(ContactFormInput::default()).await.unwrap();
    assert!(matches!(*states.borrow_and_update(), SubmissionState::Error { .. }));

    controller.reset();
    assert_eq!(*states.borrow_and_update(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_controllers_have_isolated_rate_limits() {
    let first = controller(CountingRelay::replying(200), 3);
    let second = controller(CountingRelay::replying(200), 3);

    assert!(first.submit(valid_input()).await.unwrap().is_success());
    assert!(second.submit(valid_input()).await.unwrap().is_success());
}
