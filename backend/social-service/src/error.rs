/// Error types for social-service
///
/// Every failure a handler can produce is an [`AppError`]; actix renders it as
/// `{"error": message, "status": code}`. Store and infrastructure details are
/// logged and replaced by a generic message before leaving the service.
use crate::repository::StoreError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use tracing::error;

/// Result type for social-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid input
    #[error("{0}")]
    Validation(String),

    /// A required request field is absent or empty
    #[error("{0}")]
    MissingField(String),

    #[error("Username already exists.")]
    UsernameTaken,

    /// The actor targeted themselves where that is not allowed
    #[error("{0}")]
    SelfActionForbidden(String),

    /// Concurrent toggles kept colliding; safe to retry
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{} not found.", resource))
    }

    fn is_server_error(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::MissingField(_)
            | AppError::UsernameTaken
            | AppError::SelfActionForbidden(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = if self.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation("username") => AppError::UsernameTaken,
            StoreError::UniqueViolation(field) => {
                AppError::Validation(format!("{} must be unique.", field))
            }
            StoreError::MissingReference(what) => AppError::not_found(what),
            StoreError::DuplicateEdge => AppError::Conflict(
                "Concurrent update on the same relationship, please retry.".to_string(),
            ),
            StoreError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}
