//! HTTP error mapping.

use crate::error::{ErrorClass, RedactorError};
use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
    /// Machine-readable class: `malformed_input`, `not_found`,
    /// `unsupported_media_type`, `bad_request` or `engine_failure`
    pub kind: String,
}

/// Application-specific error types for the API
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Errors raised by validation or redaction
    #[error(transparent)]
    Redaction(#[from] RedactorError),

    /// Upload with a non-PDF extension
    #[error("Only PDF files are allowed")]
    UnsupportedMediaType,

    /// Request body that could not be read at all
    #[error("{0}")]
    BadRequest(String),

    /// JSON body that does not match the request shape
    #[error("Malformed request body: {0}")]
    Json(#[from] JsonRejection),

    /// Blocking task panicked or was cancelled
    #[error("Redaction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O errors outside the redaction core (upload writes, downloads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("Failed to read multipart field: {err}"))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Redaction(e) => match e.class() {
                ErrorClass::MalformedInput => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorClass::NotFound => StatusCode::NOT_FOUND,
                ErrorClass::EngineFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Task(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Redaction(e) => e.class().as_str(),
            AppError::UnsupportedMediaType => "unsupported_media_type",
            AppError::BadRequest(_) => "bad_request",
            AppError::Json(_) => ErrorClass::MalformedInput.as_str(),
            AppError::Task(_) | AppError::Io(_) => ErrorClass::EngineFailure.as_str(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let error_response = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}
