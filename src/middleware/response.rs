use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::api::envelope::Envelope;
use crate::error::GatewayError;

/// What a handler produces on success
#[derive(Debug)]
pub enum Reply {
    /// Uniform status envelope
    Envelope(Envelope),
    /// Bare JSON, for clients that expect the backend's own shape
    Json(Value),
    /// Binary download served as `<filename>` attachment
    Attachment { filename: String, bytes: Bytes },
    /// Document produced by the backend, relayed with its content type
    Raw { content_type: String, body: Vec<u8> },
}

impl From<Envelope> for Reply {
    fn from(envelope: Envelope) -> Self {
        Reply::Envelope(envelope)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Envelope(envelope) => Json(envelope.into_value()).into_response(),
            Reply::Json(value) => Json(value).into_response(),
            Reply::Attachment { filename, bytes } => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename={}", filename),
                    ),
                ],
                bytes,
            )
                .into_response(),
            Reply::Raw { content_type, body } => {
                (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
        }
    }
}

pub type GatewayResult<T = Reply> = Result<T, GatewayError>;

/// Boundary adapter shared by every handler: log failures under the
/// operation name and render either outcome.
pub fn respond(operation: &'static str, result: GatewayResult) -> Response {
    match result {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            match &err {
                GatewayError::Forbidden(_) => {
                    tracing::warn!(operation, code = err.error_code(), "{}", err)
                }
                _ => tracing::error!(operation, code = err.error_code(), "Error running {}: {}", operation, err),
            }
            err.into_response()
        }
    }
}
