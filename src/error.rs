//! Habitlab error types
//!
//! Every fallible operation in the crate returns [`Result`]. The error maps
//! onto an HTTP response with the `{ "error": { code, message } }` envelope
//! used by all API routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Habitlab error type
#[derive(Error, Debug)]
pub enum Error {
    /// Entity does not exist, or is not visible to the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or reference constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request content failed validation
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// Subscription lifecycle transition not allowed from the current state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Caller identity missing
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller lacks the required role. Rendered as a 404.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation error carrying a single detail line
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            details: vec![message.clone()],
            message,
        }
    }

    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            // Role failures are indistinguishable from missing routes.
            Self::NotFound(_) | Self::Forbidden(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Result type alias for Habitlab operations
pub type Result<T> = std::result::Result<T, Error>;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        let (_, code) = err.status_and_code();
        let (message, details) = match err {
            Error::NotFound(msg) => (msg.clone(), Vec::new()),
            Error::Forbidden(_) => ("Not found".to_string(), Vec::new()),
            Error::Conflict(msg) | Error::InvalidTransition(msg) => (msg.clone(), Vec::new()),
            Error::Validation { message, details } => (message.clone(), details.clone()),
            Error::Unauthorized => ("Missing caller identity".to_string(), Vec::new()),
            _ => ("Internal server error".to_string(), Vec::new()),
        };
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ApiError::from(&self))).into_response()
    }
}
