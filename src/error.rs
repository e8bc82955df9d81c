/// Error types for the discussion service
///
/// Domain failures are raised as typed errors and never retried here;
/// retry/backoff belongs to the store's transport client. Each variant is
/// converted to an HTTP response for API clients.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for discussion-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Comment or parent entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor is not allowed to perform the mutation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation conflicts with the comment's lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Request failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store-level failure, propagated unmodified
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidState("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn sqlx_errors_map_to_database() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
