//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reservation_engine::{EngineError, ErrorKind};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Reservation engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApiError {
    /// The rejection returned when a reservation finds too little stock.
    pub fn insufficient_inventory() -> Self {
        ApiError::BadRequest("Insufficient Inventory".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(err) => engine_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn engine_error_to_response(err: EngineError) -> (StatusCode, String) {
    match err.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        ErrorKind::Conflict => (StatusCode::CONFLICT, err.to_string()),
        ErrorKind::InvalidToken | ErrorKind::InvalidInput => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ErrorKind::Integrity => {
            tracing::error!(error = %err, "integrity violation");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ErrorKind::Unavailable => {
            tracing::error!(error = %err, "store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}
