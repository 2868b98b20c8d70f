use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::services::conversation::Reply;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }

    let session_id = match payload.session_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            validate_session_id(id)?;
            id.to_string()
        }
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let reply = state
        .tracker
        .handle(&session_id, message, &payload.history)
        .await;

    let mut response = match reply {
        Reply::Text(reply) => Json(ChatResponse {
            session_id: session_id.clone(),
            reply,
        })
        .into_response(),
        Reply::Stream(stream) => {
            let events = stream.map(|text| Ok::<_, Infallible>(Event::default().data(text)));
            Sse::new(events).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    Ok(response)
}

fn validate_session_id(id: &str) -> Result<(), AppError> {
    let valid = id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "session_id must be up to 128 ASCII letters, digits, '-' or '_'".to_string(),
        ))
    }
}
