//! Health check handler

use crate::{models::ApiResponse, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let relay_configured = state.adapter.check_config().is_ok();
    let status = if relay_configured { "healthy" } else { "degraded" };

    Json(ApiResponse::success(json!({
        "status": status,
        "app": state.app_name,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
        "relay_configured": relay_configured,
        "active_sessions": state.sessions.len(),
    })))
}
