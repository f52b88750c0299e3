//! HTTP request handlers
//!
//! Implements the narration control endpoints.

use crate::api::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NarrateRequest {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NarrateResponse {
    pub status: String,
    pub request_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct NarrationStatusResponse {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
}

// ============================================================================
// Narration Endpoints
// ============================================================================

/// POST /api/v1/narration - request narration of a text passage
///
/// Returns 202 Accepted with the request id; the pipeline runs in the
/// background and progress arrives on the SSE stream. Interrupts any
/// narration already in flight.
pub async fn start_narration(
    State(state): State<AppState>,
    Json(req): Json<NarrateRequest>,
) -> Result<(StatusCode, Json<NarrateResponse>), (StatusCode, Json<StatusResponse>)> {
    if req.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: "error: text must not be empty".to_string(),
            }),
        ));
    }

    let request_id = state.engine.narrate(req.text, req.language).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(NarrateResponse {
            status: "accepted".to_string(),
            request_id,
        }),
    ))
}

/// DELETE /api/v1/narration - stop the current narration
///
/// No-op when idle; always returns 200.
pub async fn stop_narration(State(state): State<AppState>) -> Json<StatusResponse> {
    info!("Stop narration requested");
    state.engine.stop_narration().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// GET /api/v1/narration/status - current state of the narration pipeline
pub async fn narration_status(State(state): State<AppState>) -> Json<NarrationStatusResponse> {
    let narration_state = state.state.narration_state().await;
    let current = state.state.current().await;

    Json(NarrationStatusResponse {
        state: narration_state.to_string(),
        request_id: current.as_ref().map(|c| c.request_id),
        session_id: current.as_ref().and_then(|c| c.session_id),
    })
}
