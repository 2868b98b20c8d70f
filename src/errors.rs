use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures of a single booking attempt.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("transient service error: {0}")]
    TransientService(String),

    #[error("duplicate booking for {0}")]
    DuplicateBooking(String),

    #[error("specialist routing failed: {0}")]
    RoutingFailure(String),

    #[error("confirmation dispatch exhausted after {attempts} attempts for event {event_id}")]
    DispatchExhausted { event_id: String, attempts: u32 },

    #[error("malformed intake: {0}")]
    ParseFailure(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
