//! Session control endpoints.
//!
//! - Getting session status (GET /status)
//! - Requesting a stop (POST /stop)

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::session::SessionStatusHandle;

/// Shared state for session routes.
#[derive(Clone)]
pub struct ControlState {
    pub status: SessionStatusHandle,
    pub stop: CancellationToken,
}

pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/status", get(session_status))
        .route("/stop", post(stop_session))
        .with_state(state)
}

async fn session_status(State(state): State<ControlState>) -> Json<Value> {
    let status = state.status.get().await;
    Json(json!({
        "phase": status.phase.as_str(),
        "session_id": status.session_id,
        "duration_seconds": status.duration_seconds(),
        "stop_requested": state.stop.is_cancelled(),
        "outcome": status.outcome,
    }))
}

async fn stop_session(State(state): State<ControlState>) -> ApiResult<Json<Value>> {
    let status = state.status.get().await;
    if status.phase == crate::session::SessionPhase::Done {
        return Err(ApiError::conflict("Session already finished"));
    }

    info!("Stop requested via API (phase: {})", status.phase.as_str());
    state.stop.cancel();

    Ok(Json(json!({
        "success": true,
        "phase": status.phase.as_str(),
        "message": "Stop requested",
    })))
}
