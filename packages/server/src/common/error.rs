//! Request-level errors and their HTTP rendering.
//!
//! Every failure leaves the server as `{"detail": "<message>"}` with a status
//! chosen by the error kind. Malformed bodies and path parameters arrive here
//! through the extractors in [`super::extract`]. Streaming relays never reach this type once the
//! response has started; they report failures in-band instead.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lemmatizer::LemmaError;
use provider_client::ProviderError;
use serde::Serialize;
use thiserror::Error;

use crate::kernel::jobs::TaskHandle;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation before any work started
    #[error("{0}")]
    Input(String),

    /// Body or path could not be extracted
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Lemmatization failed; no partial result is returned
    #[error("{0}")]
    Processing(String),

    /// Provider call failed outside a stream
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// A model switch is already in flight
    #[error("{0}")]
    Conflict(String),

    #[error("Tasks still processing")]
    TasksPending,

    #[error("Task {handle} failed: {reason}")]
    TaskFailed { handle: TaskHandle, reason: String },

    #[error("Task {0} not found")]
    TaskNotFound(TaskHandle),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { status, .. } => *status,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TasksPending => StatusCode::ACCEPTED,
            AppError::TaskFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!(status = %status, error = %other, "request failed");
                }
                other.to_string()
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let (status, message) = match err {
            ProviderError::Connect(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not connect to LLM service".to_string(),
            ),
            ProviderError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Timeout while connecting to LLM service".to_string(),
            ),
            ProviderError::Status { status, body } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body,
            ),
            other @ (ProviderError::Network(_) | ProviderError::Parse(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        AppError::Upstream { status, message }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<LemmaError> for AppError {
    fn from(err: LemmaError) -> Self {
        AppError::Processing(err.to_string())
    }
}
