//! Contact form endpoints

use crate::{
    controller::{FailureKind, SubmissionOutcome},
    dispatch::DispatchOutcome,
    error::{AppError, Result},
    extractors::ContactSubmission,
    models::{ApiResponse, ServiceInterest, ServiceOption},
    AppState,
};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{info, warn};

pub fn create_contact_routes(allow_test_route: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/", post(handle_submit_contact))
        .route("/services", get(handle_list_services));

    if allow_test_route {
        router.route("/test", post(handle_test_dispatch))
    } else {
        router
    }
}

fn outcome_status(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome {
        SubmissionOutcome::Success { .. } => StatusCode::OK,
        SubmissionOutcome::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionOutcome::RejectedAsSpam { .. } => StatusCode::TOO_MANY_REQUESTS,
        SubmissionOutcome::DispatchFailed { reason } => match reason.kind {
            FailureKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Permanent => StatusCode::BAD_GATEWAY,
        },
    }
}

async fn handle_submit_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ContactSubmission(input): ContactSubmission,
) -> Result<impl IntoResponse> {
    info!("POST /api/contact - visitor: {}", addr.ip());

    let controller = state.sessions.controller_for(addr.ip());
    let outcome = controller.submit(input).await?;
    let status = outcome_status(&outcome);

    let body = match &outcome {
        SubmissionOutcome::Success { dispatch_id } => {
            ApiResponse::success(json!({ "dispatch_id": dispatch_id }))
                .with_message(outcome.user_message())
        }
        SubmissionOutcome::ValidationFailed { errors } => ApiResponse {
            success: false,
            data: Some(json!({ "errors": errors })),
            message: Some(outcome.user_message().to_string()),
        },
        _ => ApiResponse::error(outcome.user_message().to_string()),
    };

    Ok((status, Json(body)))
}

async fn handle_list_services() -> impl IntoResponse {
    let services: Vec<ServiceOption> = ServiceInterest::ALL
        .iter()
        .copied()
        .map(ServiceOption::from)
        .collect();

    Json(ApiResponse::success(services))
}

async fn handle_test_dispatch(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("POST /api/contact/test - sending relay test message");

    if let Err(issue) = state.adapter.check_config() {
        return Err(AppError::ServiceUnavailable(issue.to_string()));
    }

    let outcome = state.adapter.send_test_message().await;
    let status = match &outcome {
        DispatchOutcome::Success { .. } => StatusCode::OK,
        DispatchOutcome::TransientFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DispatchOutcome::PermanentFailure { .. } => StatusCode::BAD_GATEWAY,
    };

    if !outcome.is_success() {
        warn!(outcome = ?outcome, "Relay test message failed");
    }

    Ok((status, Json(ApiResponse::success(outcome))))
}
