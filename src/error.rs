// Gateway error types and their HTTP rendering
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::api::envelope::Envelope;
use crate::backend::BackendError;

/// Every failure a handler can produce.
///
/// All variants except `Forbidden` render as a failure envelope with HTTP 200,
/// so clients only ever inspect the `status` field.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or malformed request field
    #[error("{0}")]
    Parameter(String),

    /// Error raised by the delegated backend client
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Lookup that has no answer for the requested path
    #[error("{0}")]
    NotFound(String),

    /// Destructive action attempted while disabled
    #[error("{0}")]
    Forbidden(String),

    /// Upstream proxy answered with an error status
    #[error("{reason}")]
    Upstream {
        code: u16,
        reason: String,
        content: String,
    },

    /// Upstream proxy could not be reached
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn parameter(message: impl Into<String>) -> Self {
        GatewayError::Parameter(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GatewayError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        GatewayError::Forbidden(message.into())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::OK,
        }
    }

    /// Get error code for client handling and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Parameter(_) => "PARAMETER_ERROR",
            GatewayError::Backend(_) => "BACKEND_ERROR",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::Forbidden(_) => "FORBIDDEN",
            GatewayError::Upstream { .. } => "UPSTREAM_ERROR",
            GatewayError::Transport(_) => "UPSTREAM_UNREACHABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            GatewayError::Forbidden(message) => json!({
                "error": true,
                "message": message,
                "code": self.error_code(),
            }),
            GatewayError::Upstream {
                code,
                reason,
                content,
            } => json!({
                "status": Envelope::FAILURE,
                "code": code,
                "message": reason,
                "content": content,
            }),
            _ => Envelope::failure(self.to_string()).into_value(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Parameter(format!("Malformed JSON: {}", err))
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
