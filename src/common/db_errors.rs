//! Database error categorisation and message formatting
//!
//! Every service maps `DbErr` through [`format_db_error`] so that constraint
//! violations and connectivity failures surface with a consistent category.
//!
//! ```rust
//! use ea_catalog::common::db_errors::*;
//! use sea_orm::DbErr;
//!
//! let err = DbErr::RecordNotFound("entity 7".to_string());
//! let (kind, message) = format_db_error("get entity", &err);
//!
//! assert_eq!(kind, DbErrorKind::NotFound);
//! assert_eq!(message, "get entity: record not found");
//! ```

use sea_orm::{DbErr, SqlErr};

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Query returned no rows
    NotFound,

    /// Unique constraint violation
    UniqueViolation,

    /// Foreign key constraint violation
    ForeignKeyViolation,

    /// Database unreachable
    ConnectionError,

    /// Query or connection timeout
    Timeout,

    /// Transaction deadlock
    Deadlock,

    /// Anything else
    Unknown,
}

impl DbErrorKind {
    /// Categorise a sea_orm database error
    ///
    /// Driver-level constraint information is used when present, otherwise
    /// the error message is inspected.
    ///
    /// ```
    /// use ea_catalog::common::db_errors::DbErrorKind;
    /// use sea_orm::DbErr;
    ///
    /// let err = DbErr::Custom("UNIQUE constraint failed: tags.name".to_string());
    /// assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::UniqueViolation);
    /// ```
    pub fn from_db_err(err: &DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Self::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Self::ForeignKeyViolation,
            _ => {}
        }

        let msg_lower = err.to_string().to_lowercase();
        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) if msg_lower.contains("timeout") => {
                Self::Timeout
            }
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::ConnectionError,
            _ => Self::from_message(&msg_lower),
        }
    }

    fn from_message(msg_lower: &str) -> Self {
        if msg_lower.contains("unique") || msg_lower.contains("duplicate") {
            Self::UniqueViolation
        } else if msg_lower.contains("foreign key") || msg_lower.contains("fk_") {
            Self::ForeignKeyViolation
        } else if msg_lower.contains("deadlock") {
            Self::Deadlock
        } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            Self::Timeout
        } else if msg_lower.contains("connection refused")
            || msg_lower.contains("connection reset")
            || msg_lower.contains("connection closed")
        {
            Self::ConnectionError
        } else {
            Self::Unknown
        }
    }

    /// HTTP status code for this error kind
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UniqueViolation => 409,
            Self::ForeignKeyViolation => 400,
            Self::ConnectionError => 503,
            Self::Timeout => 504,
            Self::Deadlock => 503,
            Self::Unknown => 500,
        }
    }

    /// Transient errors that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout | Self::Deadlock)
    }
}

/// Format a database error with the operation that failed
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);

    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        DbErrorKind::UniqueViolation => format!("{}: duplicate key violation", operation),
        DbErrorKind::ForeignKeyViolation => {
            format!("{}: foreign key constraint violation", operation)
        }
        DbErrorKind::ConnectionError => format!("{}: database connection failed", operation),
        DbErrorKind::Timeout => format!("{}: query timeout", operation),
        DbErrorKind::Deadlock => format!("{}: transaction deadlock", operation),
        DbErrorKind::Unknown => format!("{}: database error - {}", operation, err),
    };

    (kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_categorize_record_not_found() {
        let err = DbErr::RecordNotFound("entity not found".to_string());
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::NotFound);
        assert_eq!(kind.http_status_code(), 404);
        assert!(!kind.is_retryable());
    }

    #[test]
    fn test_categorize_connection_error() {
        let err = DbErr::Conn(RuntimeErr::Internal("Connection refused".to_string()));
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::ConnectionError);
        assert_eq!(kind.http_status_code(), 503);
        assert!(kind.is_retryable());
    }

    #[test]
    fn test_categorize_timeout() {
        let err = DbErr::Conn(RuntimeErr::Internal(
            "connection timeout after 30s".to_string(),
        ));
        assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::Timeout);
    }

    #[test]
    fn test_categorize_unique_violation() {
        let err = DbErr::Query(RuntimeErr::Internal(
            "UNIQUE constraint failed: relationships.source_id".to_string(),
        ));
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::UniqueViolation);
        assert!(!kind.is_retryable());
    }

    #[test]
    fn test_categorize_foreign_key_violation() {
        let err = DbErr::Exec(RuntimeErr::Internal(
            "FOREIGN KEY constraint failed".to_string(),
        ));
        assert_eq!(
            DbErrorKind::from_db_err(&err),
            DbErrorKind::ForeignKeyViolation
        );
    }

    #[test]
    fn test_categorize_deadlock() {
        let err = DbErr::Custom("Deadlock detected".to_string());
        assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::Deadlock);
    }

    #[test]
    fn test_format_db_error_unique_violation() {
        let err = DbErr::Custom("duplicate key value violates unique constraint".to_string());
        let (kind, message) = format_db_error("create tag", &err);

        assert_eq!(kind, DbErrorKind::UniqueViolation);
        assert_eq!(message, "create tag: duplicate key violation");
    }

    #[test]
    fn test_format_unknown_keeps_detail() {
        let err = DbErr::Custom("something odd".to_string());
        let (kind, message) = format_db_error("list tags", &err);

        assert_eq!(kind, DbErrorKind::Unknown);
        assert!(message.contains("something odd"));
    }
}
