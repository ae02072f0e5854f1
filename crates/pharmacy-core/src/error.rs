//! Errors surfaced by the business operations.

use thiserror::Error;

use crate::db::DbError;

/// Failure of a business operation.
///
/// The transaction of the failing operation has already been rolled back
/// when one of these reaches the caller.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ServiceError {
    /// Stable machine-readable code for client layers.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::InvalidRange(_) => "INVALID_RANGE",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::InvalidState(_) => "INVALID_STATE",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::Database(DbError::NotFound(_)) => "NOT_FOUND",
            ServiceError::Database(_) => "INTERNAL",
        }
    }

    pub(crate) fn not_found(kind: &str, id: &str) -> Self {
        ServiceError::NotFound(format!("{} {}", kind, id))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
