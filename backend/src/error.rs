//! Error types for the VIN service.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Unified error type for service operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request to the decode API failed (network error, timeout, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Decode API answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Import payload was not valid base64
    #[error("Input string is not a valid Base64 string: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    /// Import started without CSV content or without a file name
    #[error("Orchestration failed: Missing or invalid Base64 CSV.")]
    MissingPayload,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking or spawned task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result alias for service operations
pub type Result<T> = std::result::Result<T, AppError>;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Internal failures are logged where they happen; clients only get a generic message.
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(message) | AppError::BadRequest(message) => {
                HttpResponse::build(self.status_code()).body(message.clone())
            }
            _ => HttpResponse::InternalServerError()
                .body("An unexpected error occurred. Please try again later."),
        }
    }
}
