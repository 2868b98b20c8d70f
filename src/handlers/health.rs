use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    confirmation_enabled: bool,
    active_sessions: usize,
}

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        confirmation_enabled: state.config.confirmation_enabled(),
        active_sessions: state.tracker.active_sessions(),
    })
}
