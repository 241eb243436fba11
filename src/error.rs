/// Unified error types for Wishwall
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the wishes service
#[derive(Error, Debug)]
pub enum WishError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Validation errors (blank name, missing file, bad request body)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input that cannot be interpreted, such as a malformed download URL
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Blob storage errors
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for WishError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            WishError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            WishError::InvalidInput(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidInput",
                self.to_string(),
            ),
            WishError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            WishError::Database(_)
            | WishError::Migration(_)
            | WishError::BlobStorage(_)
            | WishError::Internal(_)
            | WishError::Io(_) => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Something went wrong, please try again".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for wish operations
pub type WishResult<T> = Result<T, WishError>;
