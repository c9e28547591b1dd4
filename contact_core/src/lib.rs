//! Core library for the contact form service: validation, spam screening,
//! retried relay dispatch and the HTTP routes that tie them together.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod retry;
pub mod sessions;
pub mod spam;
pub mod validation;

pub use config::AppConfig;
pub use controller::{ControllerError, SubmissionController, SubmissionOutcome, SubmissionState};
pub use dispatch::{DispatchAdapter, DispatchOutcome, EmailJsClient, EmailRelay};
pub use error::{AppError, Result};
pub use handlers::create_routes;
pub use retry::{with_retry, BackoffStrategy, RetryPolicy};
pub use sessions::SessionRegistry;
pub use spam::{GuardDecision, RateLimitState, RejectionReason, SpamGuard};

use axum::Router;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub sessions: SessionRegistry,
    pub adapter: Arc<DispatchAdapter>,
}

impl AppState {
    pub fn new(config: &AppConfig, relay: Arc<dyn EmailRelay>) -> Self {
        let adapter = Arc::new(DispatchAdapter::new(
            relay,
            config.relay.clone(),
            config.business.clone(),
        ));
        let sessions = SessionRegistry::from_config(adapter.clone(), &config.submission);

        Self {
            app_name: config.business.business_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions,
            adapter,
        }
    }
}

pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let layers = ServiceBuilder::new()
        .layer(middleware::logging::logging_layer())
        .layer(middleware::cors::cors_layer_from_config(&config.cors))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )));

    Router::new()
        .merge(create_routes(config.relay.allow_test_route))
        .layer(layers)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
