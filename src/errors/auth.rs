//! Authentication and authorisation error types
//!
//! ```rust
//! use ea_catalog::errors::AuthError;
//!
//! let err = AuthError::AccountLocked { retry_after_secs: 120 };
//! assert_eq!(err.http_status_code(), 423);
//! ```

use thiserror::Error;

/// Authentication and authorisation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Too many failed attempts; the account is temporarily locked
    #[error("Account is locked due to too many failed attempts. Try again in {retry_after_secs} seconds")]
    AccountLocked { retry_after_secs: i64 },

    /// Missing or unknown session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Session has expired
    #[error("Session expired")]
    SessionExpired,

    /// Role does not allow the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Invalid role specified
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Admin user already exists
    #[error("Admin '{0}' already exists")]
    UserAlreadyExists(String),

    /// Admin user not found
    #[error("Admin '{0}' not found")]
    UserNotFound(String),

    /// Admins cannot delete their own account
    #[error("Cannot delete your own account")]
    CannotDeleteSelf,

    /// At least one super admin must remain
    #[error("Cannot delete the last super admin")]
    LastSuperAdmin,
}

impl AuthError {
    /// Check if this is an authentication error (401)
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::AuthenticationRequired
                | AuthError::SessionExpired
        )
    }

    /// Check if this is an authorisation error (403)
    pub fn is_authorisation_error(&self) -> bool {
        matches!(
            self,
            AuthError::PermissionDenied(_) | AuthError::CannotDeleteSelf | AuthError::LastSuperAdmin
        )
    }

    /// Check if this is a validation error (400)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AuthError::WeakPassword(_) | AuthError::InvalidUsername(_) | AuthError::InvalidRole(_)
        )
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::AuthenticationRequired
            | AuthError::SessionExpired => 401,
            AuthError::PermissionDenied(_)
            | AuthError::CannotDeleteSelf
            | AuthError::LastSuperAdmin => 403,
            AuthError::UserNotFound(_) => 404,
            AuthError::UserAlreadyExists(_) => 409,
            AuthError::AccountLocked { .. } => 423,
            AuthError::WeakPassword(_)
            | AuthError::InvalidUsername(_)
            | AuthError::InvalidRole(_) => 400,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::PermissionDenied(_) => "PERMISSION_DENIED",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::InvalidUsername(_) => "INVALID_USERNAME",
            AuthError::InvalidRole(_) => "INVALID_ROLE",
            AuthError::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            AuthError::UserNotFound(_) => "USER_NOT_FOUND",
            AuthError::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            AuthError::LastSuperAdmin => "LAST_SUPER_ADMIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials() {
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid username or password");
        assert!(err.is_authentication_error());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_account_locked() {
        let err = AuthError::AccountLocked {
            retry_after_secs: 90,
        };
        assert!(err.to_string().contains("90 seconds"));
        assert_eq!(err.http_status_code(), 423);
        assert_eq!(err.error_code(), "ACCOUNT_LOCKED");
    }

    #[test]
    fn test_permission_denied() {
        let err = AuthError::PermissionDenied("manage admins".to_string());
        assert_eq!(err.to_string(), "Permission denied: manage admins");
        assert!(err.is_authorisation_error());
        assert_eq!(err.http_status_code(), 403);
    }

    #[test]
    fn test_weak_password() {
        let err = AuthError::WeakPassword("too short".to_string());
        assert!(err.is_validation_error());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "WEAK_PASSWORD");
    }

    #[test]
    fn test_user_already_exists() {
        let err = AuthError::UserAlreadyExists("alice".to_string());
        assert_eq!(err.to_string(), "Admin 'alice' already exists");
        assert_eq!(err.http_status_code(), 409);
    }
}
