//! Error types for the HTTP layer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use thiserror::Error;
use vitalis_rs_core::VitalisCoreError;

/// Message returned when a turn runs out of steps.
pub const STEP_LIMIT_MESSAGE: &str = "Conversation too complex. Please try a simpler request.";

/// Failures starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Error response with an HTTP status and a client-facing message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{resource} not found"))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.status.as_u16(),
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<VitalisCoreError> for ApiError {
    fn from(err: VitalisCoreError) -> Self {
        match err {
            VitalisCoreError::StepLimitExceeded { .. } => Self::bad_request(STEP_LIMIT_MESSAGE),
            VitalisCoreError::UnknownThread(thread_id) => {
                Self::not_found(&format!("thread {thread_id}"))
            }
            VitalisCoreError::InvalidRequest(message) => Self::bad_request(message),
            VitalisCoreError::Configuration(message) => {
                error!("assistant misconfigured: {}", message);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
            }
            other => {
                error!("request failed: {}", other);
                Self::internal(other.to_string())
            }
        }
    }
}
