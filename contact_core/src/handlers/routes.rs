//! Top-level router assembly

use super::{contact::create_contact_routes, health::handle_health};
use crate::{models::ApiResponse, AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

pub fn create_routes(allow_test_route: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .nest("/api/contact", create_contact_routes(allow_test_route))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(json!({
        "app": state.app_name,
        "version": state.version,
        "endpoints": {
            "health": "/health",
            "contact": "/api/contact",
            "services": "/api/contact/services"
        }
    })))
}
