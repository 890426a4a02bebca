//! Unified error handling for the server.
//!
//! Engine errors map onto HTTP statuses: validation, illegal-state,
//! insufficient-balance and round-ended failures are client errors (400),
//! unknown resources are 404, everything else is a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use engine::EngineError;
use serde_json::json;

/// Application error type with HTTP response mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = axum::Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound(msg) => AppError::NotFound(msg),
            EngineError::BadRequest(msg) => AppError::BadRequest(msg),
            EngineError::IllegalState(msg) => AppError::BadRequest(msg),
            EngineError::RoundEnded => AppError::BadRequest("round has ended".into()),
            EngineError::InsufficientBalance => {
                AppError::BadRequest("insufficient balance".into())
            }
            EngineError::Conflict | EngineError::Internal(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
