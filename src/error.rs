//! Error types and error handling for request handlers
//!
//! Request-scoped failures are converted into bare status codes. The contacts
//! API never writes an error body; the status alone tells the client what went
//! wrong.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Request-level error types
///
/// Every variant maps to a fixed status code via `IntoResponse`. None of
/// them leave the handler that raised it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body could not be read from the connection
    #[error("Unreadable request body: {0}")]
    UnreadableBody(String),

    /// Request body is not a JSON contact
    #[error("Invalid contact payload: {0}")]
    InvalidContact(#[from] serde_json::Error),

    /// HTTP method is not served on this route
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Store could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl AppError {
    /// Status code sent to the client for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidContact(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        status.into_response()
    }
}
