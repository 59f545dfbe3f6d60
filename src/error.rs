use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the limiters and the HTTP layer around them.
///
/// "Limit exceeded" is not an error: it is the `true` result of
/// [`RateLimiter::decide`](crate::algorithms::RateLimiter::decide).
#[derive(Debug, Error)]
pub enum ThrottlerError {
    /// Nonsensical limiter parameters, detected at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Counter or time arithmetic produced a state the decision logic cannot trust.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Peer address without a separable host and port.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ThrottlerResult<T> = std::result::Result<T, ThrottlerError>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_error(err: &ThrottlerError) -> Self {
        let message = err.to_string();
        match err {
            ThrottlerError::InvalidIdentifier(_) => Self::new("bad_request", &message, 400),
            ThrottlerError::Configuration(_) => Self::new("configuration_error", &message, 500),
            ThrottlerError::InvariantViolation(_) => Self::new("invariant_violation", &message, 500),
            ThrottlerError::InternalError(_) | ThrottlerError::Io(_) => {
                Self::new("internal_error", &message, 500)
            }
        }
    }
}

impl IntoResponse for ThrottlerError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from_error(&self);
        let status =
            StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
