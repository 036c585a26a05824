use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use areg_registry::RegistryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status and a stable machine-readable kind.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Registry(err) => match err {
                RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                RegistryError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                RegistryError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                RegistryError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
                RegistryError::CapacityExceeded(_) => (StatusCode::PAYLOAD_TOO_LARGE, "capacity_exceeded"),
                RegistryError::DuplicateEntry(_) => (StatusCode::CONFLICT, "duplicate_entry"),
                RegistryError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::AuthFailed(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": kind, "message": self.to_string() }))).into_response()
    }
}
