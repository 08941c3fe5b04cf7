//! Domain-specific error types for the catalog
//!
//! # Error Categories
//!
//! - **CatalogError**: catalog CRUD operations (validation, missing rows,
//!   uniqueness conflicts, permission checks, database failures)
//! - **AuthError**: authentication, lockout and admin management
//!
//! Both types carry an HTTP status code and a stable error code so the
//! server layer can render them without inspecting messages.
//!
//! # Examples
//!
//! ```rust
//! use ea_catalog::errors::{AuthError, CatalogError};
//!
//! let err = CatalogError::not_found("entity", 42);
//! assert_eq!(err.http_status_code(), 404);
//!
//! let err: CatalogError = AuthError::InvalidCredentials.into();
//! assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
//! ```

pub mod auth;
pub mod catalog;

pub use auth::AuthError;
pub use catalog::CatalogError;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_result_alias() {
        let result: CatalogResult<i32> = Err(CatalogError::not_found("entity", 42));
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_result_alias() {
        let result: AuthResult<()> = Err(AuthError::InvalidCredentials);
        assert!(result.is_err());
    }
}
