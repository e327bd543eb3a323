use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::utils::time::to_rfc3339;
use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "time": to_rfc3339(state.clock.now()),
        "pending_notifications": state.notification_service.pending_count(),
    });
    (StatusCode::OK, Json(body))
}
