//! Error types for the certdesk HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certdesk_core::{CertdeskError, ErrorBody};
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum SrvError {
    /// Listener failed to bind or the server loop failed.
    #[error("http server error: {0}")]
    Server(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Service setup failed (user store, paths).
    #[error(transparent)]
    Service(#[from] CertdeskError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request failure, rendered as `{"error": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub CertdeskError);

impl From<CertdeskError> for ApiError {
    fn from(err: CertdeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .status_code()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let err = self.0;
        let body = match &err {
            CertdeskError::ExternalAction {
                action,
                status: exit,
                output,
            } => ErrorBody {
                error: err.to_string(),
                action: Some(action.clone()),
                status: *exit,
                output: Some(output.clone()),
            },
            other => ErrorBody {
                error: other.to_string(),
                ..ErrorBody::default()
            },
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %body.error, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
