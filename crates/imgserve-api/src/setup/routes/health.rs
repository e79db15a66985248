//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// Liveness probe - process is running. Reports engine handle accounting alongside.
pub async fn liveness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let runtime = &state.runtime;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "engine": {
                "live_handles": runtime.live_handles(),
                "handles_opened": runtime.handles_opened(),
                "shut_down": runtime.is_shut_down(),
            }
        })),
    )
}
