//! Catalog operation errors
//!
//! Every database error that reaches this type is categorised first, so a
//! duplicate relationship surfaces as [`CatalogError::Conflict`] rather than
//! an opaque driver error.

use sea_orm::DbErr;
use thiserror::Error;

use super::AuthError;
use crate::common::db_errors::{format_db_error, DbErrorKind};

/// Errors raised by catalog services
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Invalid or missing field on create/update
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation on a row that does not exist
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication, lockout or permission failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database unreachable or timing out
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] DbErr),

    /// Failure outside the database, such as password hashing
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        CatalogError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CatalogError::Conflict(message.into())
    }

    /// Categorise a database error raised while performing `operation`
    pub fn from_db(operation: &str, err: DbErr) -> Self {
        let (kind, message) = format_db_error(operation, &err);
        match kind {
            DbErrorKind::UniqueViolation => CatalogError::Conflict(message),
            DbErrorKind::ForeignKeyViolation => CatalogError::Validation(message),
            DbErrorKind::ConnectionError | DbErrorKind::Timeout | DbErrorKind::Deadlock => {
                CatalogError::Unavailable(message)
            }
            DbErrorKind::NotFound | DbErrorKind::Unknown => CatalogError::Database(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Conflict(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 400,
            CatalogError::NotFound { .. } => 404,
            CatalogError::Conflict(_) => 409,
            CatalogError::Auth(err) => err.http_status_code(),
            CatalogError::Unavailable(_) => 503,
            CatalogError::Database(_) | CatalogError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::NotFound { .. } => "NOT_FOUND",
            CatalogError::Conflict(_) => "CONFLICT",
            CatalogError::Auth(err) => err.error_code(),
            CatalogError::Unavailable(_) => "DATABASE_UNAVAILABLE",
            CatalogError::Database(_) => "DATABASE_ERROR",
            CatalogError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DbErr> for CatalogError {
    fn from(err: DbErr) -> Self {
        CatalogError::from_db("database operation", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = CatalogError::not_found("entity", 7);
        assert_eq!(err.to_string(), "entity 7 not found");
        assert!(err.is_not_found());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_validation() {
        let err = CatalogError::validation("Name is required");
        assert_eq!(err.to_string(), "Validation error: Name is required");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_auth_passthrough() {
        let err: CatalogError = AuthError::PermissionDenied("bulk delete".to_string()).into();
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_eq!(err.to_string(), "Permission denied: bulk delete");
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = CatalogError::from_db(
            "create relationship",
            DbErr::Custom("UNIQUE constraint failed: relationships.source_id".to_string()),
        );
        assert!(err.is_conflict());
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_connection_error_is_unavailable() {
        let err = CatalogError::from_db(
            "list entities",
            DbErr::Custom("connection refused".to_string()),
        );
        assert_eq!(err.http_status_code(), 503);
    }
}
