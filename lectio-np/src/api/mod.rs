//! REST API implementation for the narration player
//!
//! Exposes narration control endpoints plus an SSE event stream.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::NarrationEngine;
use crate::state::SharedState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Narration engine
    pub engine: Arc<NarrationEngine>,
    /// Shared narration state
    pub state: Arc<SharedState>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                .route("/narration", post(handlers::start_narration))
                .route("/narration", delete(handlers::stop_narration))
                .route("/narration/status", get(handlers::narration_status))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "lectio-np",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}
