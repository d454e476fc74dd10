//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body of the form
//! `{"error": "..."}` with a matching status code.
//!
//! I/O and internal failures are logged with full detail but only a generic
//! message is returned, so upload paths never reach the browser.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gemchat_core::ChatError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// All errors that can occur in the gemchat-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the chat core.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured upload cap.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Chat(ChatError::EmptyMessage) => StatusCode::BAD_REQUEST,
            ServerError::Chat(ChatError::UpstreamTransient { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Chat(ChatError::UpstreamFatal { .. }) => StatusCode::BAD_GATEWAY,
            ServerError::Chat(ChatError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            ServerError::Chat(ChatError::Io(e)) => {
                error!(error = %e, "failed to read uploaded file");
                "internal server error".to_owned()
            }
            ServerError::Chat(e) => {
                if status.is_server_error() {
                    warn!(
                        error = %e,
                        upstream_status = ?e.upstream_status(),
                        retryable = e.is_retryable(),
                        "upstream failure"
                    );
                }
                e.to_string()
            }
            ServerError::BadRequest(m) | ServerError::PayloadTooLarge(m) => m.clone(),
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}
