//! Per-visitor submission controllers, bounded by an LRU

use crate::config::SubmissionConfig;
use crate::controller::SubmissionController;
use crate::dispatch::DispatchAdapter;
use crate::retry::RetryPolicy;
use crate::spam::{RateLimitState, SpamGuard};
use lru::LruCache;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Hands each visitor their own controller, each with isolated rate-limit state.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<LruCache<IpAddr, SubmissionController>>>,
    adapter: Arc<DispatchAdapter>,
    retry: RetryPolicy,
    cooldown: Duration,
    max_sessions: NonZeroUsize,
}

impl SessionRegistry {
    pub fn new(adapter: Arc<DispatchAdapter>, retry: RetryPolicy, cooldown: Duration, max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);

        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(capacity))),
            adapter,
            retry,
            cooldown,
            max_sessions: capacity,
        }
    }

    pub fn from_config(adapter: Arc<DispatchAdapter>, config: &SubmissionConfig) -> Self {
        Self::new(
            adapter,
            RetryPolicy::from_config(config),
            Duration::from_secs(config.cooldown_seconds),
            config.max_sessions,
        )
    }

    pub fn adapter(&self) -> &Arc<DispatchAdapter> {
        &self.adapter
    }

    pub fn controller_for(&self, visitor: IpAddr) -> SubmissionController {
        let mut sessions = self.sessions.lock();

        if let Some(controller) = sessions.get(&visitor) {
            return controller.clone();
        }

        self.make_room(&mut sessions);

        let guard = SpamGuard::new(self.cooldown, RateLimitState::new());
        let controller = SubmissionController::new(self.adapter.clone(), self.retry.clone(), guard);
        sessions.put(visitor, controller.clone());

        controller
    }

    /// Frees one slot by evicting idle sessions, oldest first. Sessions with a
    /// submission in flight are never evicted; if every session is busy the
    /// cache grows past `max_sessions` until they finish.
    fn make_room(&self, sessions: &mut LruCache<IpAddr, SubmissionController>) {
        let limit = self.max_sessions.get();
        let mut skipped = 0;

        while sessions.len() >= limit && skipped < sessions.len() {
            let Some((&visitor, controller)) = sessions.peek_lru() else {
                break;
            };

            if controller.is_submitting() {
                sessions.promote(&visitor);
                skipped += 1;
                continue;
            }

            if let Some((evicted, old)) = sessions.pop_lru() {
                debug!(visitor = %evicted, "Evicting least recently used contact session");
                old.dispose();
            }
        }

        let wanted = (sessions.len() + 1).max(limit);
        if wanted != sessions.cap().get() {
            if wanted > limit {
                warn!(sessions = sessions.len(), limit, "Every contact session is busy, growing registry");
            }
            if let Some(capacity) = NonZeroUsize::new(wanted) {
                sessions.resize(capacity);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BusinessConfig, RelayConfig};
    use crate::dispatch::{EmailRelay, RelayError, RelayRequest, RelayResponse};
    use crate::controller::{ControllerError, SubmissionOutcome};
    use crate::models::ContactFormInput;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    struct OkRelay;

    #[async_trait]
    impl EmailRelay for OkRelay {
        async fn send(&self, _request: &RelayRequest) -> Result<RelayResponse, RelayError> {
            Ok(RelayResponse::ok())
        }
    }

    fn registry(max_sessions: usize) -> SessionRegistry {
        let adapter = Arc::new(DispatchAdapter::new(
            Arc::new(OkRelay),
            RelayConfig::new("service_test", "template_test", "public_test"),
            BusinessConfig::default(),
        ));
        SessionRegistry::new(adapter, RetryPolicy::new(3), Duration::from_secs(60), max_sessions)
    }

    #[test]
    fn test_same_visitor_gets_same_controller() {
        let registry = registry(10);
        let visitor: IpAddr = "203.0.113.7".parse().unwrap();

        let first = registry.controller_for(visitor);
        first.rate_limit().record_accepted(Utc::now());

        let second = registry.controller_for(visitor);
        assert!(second.rate_limit().last_accepted_at().is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_visitors_are_isolated() {
        let registry = registry(10);

        let first = registry.controller_for("203.0.113.7".parse().unwrap());
        first.rate_limit().record_accepted(Utc::now());

        let other = registry.controller_for("203.0.113.8".parse().unwrap());
        assert!(other.rate_limit().last_accepted_at().is_none());
    }

    struct GatedRelay {
        entered: Notify,
        release: Notify,
        calls: AtomicU32,
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

    fn input() -> ContactFormInput {
        ContactFormInput::new(
            "John Doe",
            "john@example.com",
            "5551234567",
            "lawn-care",
            "Please give me a quote",
        )
    }

    #[tokio::test]
    async fn test_busy_session_survives_eviction() {
        let relay = Arc::new(GatedRelay {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicU32::new(0),
        });
        let adapter = Arc::new(DispatchAdapter::new(
            relay.clone(),
            RelayConfig::new("service_test", "template_test", "public_test"),
            BusinessConfig::default(),
        ));
        let registry = SessionRegistry::new(adapter, RetryPolicy::new(3), Duration::from_secs(60), 1);
        let busy: IpAddr = "203.0.113.7".parse().unwrap();

        let first = registry.controller_for(busy);
        let in_flight = tokio::spawn({
            let first = first.clone();
            async move { first.submit(input()).await }
        });
        relay.entered.notified().await;

        registry.controller_for("203.0.113.8".parse().unwrap());
        assert!(!first.is_disposed());
        assert_eq!(registry.len(), 2);

        let again = registry.controller_for(busy).submit(input()).await;
        assert_eq!(again, Err(ControllerError::AlreadySubmitting));

        relay.release.notify_one();
        assert!(in_flight.await.unwrap().unwrap().is_success());
        assert_eq!(relay.calls.load(Ordering::SeqCst), 1);

        let after = registry.controller_for(busy).submit(input()).await.unwrap();
        assert!(matches!(after, SubmissionOutcome::RejectedAsSpam { .. }));
        assert_eq!(relay.calls.load(Ordering::SeqCst), 1);

        registry.controller_for("203.0.113.9".parse().unwrap());
        assert_eq!(registry.len(), 1);
        assert!(first.is_disposed());
    }

    #[test]
    fn test_eviction_disposes_old_controller() {
        let registry = registry(1);

        let first = registry.controller_for("203.0.113.7".parse().unwrap());
        registry.controller_for("203.0.113.8".parse().unwrap());

        assert_eq!(registry.len(), 1);
        assert!(first.is_disposed());
    }
}
