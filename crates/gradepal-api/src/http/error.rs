//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use gradepal_types::error::{ChatError, RecordsError, RepositoryError};
use gradepal_types::stream::STREAM_ERROR_MESSAGE;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat turn and thread errors.
    Chat(ChatError),
    /// Grade-recording errors.
    Records(RecordsError),
    /// Storage errors outside a service call.
    Repository(RepositoryError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<RecordsError> for AppError {
    fn from(e: RecordsError) -> Self {
        AppError::Records(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// Status, machine code and client-facing message.
    ///
    /// Upstream and storage details are logged here and never returned.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::NotFound) => {
                (StatusCode::NOT_FOUND, "THREAD_NOT_FOUND", "Thread not found".to_string())
            }
            AppError::Chat(ChatError::Busy) => (
                StatusCode::CONFLICT,
                "TURN_IN_PROGRESS",
                "A reply is already being generated for this thread".to_string(),
            ),
            AppError::Chat(ChatError::UpstreamUnavailable(detail)) => {
                warn!(error = %detail, "Chat provider unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    STREAM_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::Chat(ChatError::Repository(e))
            | AppError::Records(RecordsError::Repository(e)) => {
                error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE.to_string())
            }
            AppError::Records(RecordsError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Records(RecordsError::Forbidden) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", RecordsError::Forbidden.to_string())
            }
            AppError::Records(RecordsError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", RecordsError::NotFound.to_string())
            }
            AppError::Repository(e) => {
                error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
