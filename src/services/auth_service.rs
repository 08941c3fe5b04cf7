use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::auth::{AdminActor, AdminRole};
use crate::config::AuthConfig;
use crate::database::entities::audit_log::{subject, AuditAction};
use crate::database::entities::{admin_sessions, admin_users};
use crate::errors::{AuthError, CatalogError, CatalogResult};
use crate::services::audit_service::{AuditRecord, AuditService};
use crate::services::ValidationService;

pub const BOOTSTRAP_USERNAME: &str = "superadmin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct SessionInfo {
    pub session_id: String,
    pub username: String,
    pub role: AdminRole,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of comparing a password with a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Mismatch,
    Match,
    /// Matched a legacy SHA-256 digest; the caller should store a bcrypt hash
    MatchNeedsRehash,
}

/// Login, lockout and session handling
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, config: AuthConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Hash a password with bcrypt after checking the password rules
    pub fn hash_password(password: &str, cost: u32) -> CatalogResult<String> {
        ValidationService::validate_password(password)?;
        Self::bcrypt_hash(password, cost)
    }

    /// Hash without the password rules. Only for passwords that already
    /// authenticated against a stored hash.
    fn bcrypt_hash(password: &str, cost: u32) -> CatalogResult<String> {
        bcrypt::hash(password, cost)
            .map_err(|e| CatalogError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Compare against a bcrypt hash, or an unsalted SHA-256 hex digest
    /// written by earlier deployments.
    pub fn verify_password(password: &str, stored_hash: &str) -> PasswordCheck {
        if stored_hash.starts_with("$2") {
            return match bcrypt::verify(password, stored_hash) {
                Ok(true) => PasswordCheck::Match,
                _ => PasswordCheck::Mismatch,
            };
        }

        if stored_hash.len() == 64 && stored_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            let digest = Self::legacy_digest(password);
            if digest.eq_ignore_ascii_case(stored_hash) {
                return PasswordCheck::MatchNeedsRehash;
            }
        }

        PasswordCheck::Mismatch
    }

    pub fn legacy_digest(password: &str) -> String {
        Sha256::digest(password.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Check credentials and open a session.
    ///
    /// Each failure increments `failed_attempts`; reaching the configured
    /// threshold locks the account. A locked account rejects every attempt,
    /// correct or not, until `lockout_window_secs` have passed since the last
    /// failure. Rejections during the window are not counted.
    pub async fn login(&self, username: &str, password: &str) -> CatalogResult<SessionInfo> {
        let user = admin_users::Entity::find_by_id(username.to_string())
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find admin", e))?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        if let Some(retry_after_secs) = self.remaining_lockout(&user, now) {
            warn!(
                "Login rejected for locked account '{}' ({}s remaining)",
                username, retry_after_secs
            );
            return Err(AuthError::AccountLocked { retry_after_secs }.into());
        }

        let check = Self::verify_password(password, &user.password_hash);
        if check == PasswordCheck::Mismatch {
            return Err(self.record_failure(&user.username, now).await);
        }

        let txn = self.db.begin().await?;

        let role = user
            .get_role()
            .ok_or_else(|| AuthError::InvalidRole(user.role.clone()))?;

        let mut model: admin_users::ActiveModel = user.into();
        if check == PasswordCheck::MatchNeedsRehash {
            model.password_hash = Set(Self::bcrypt_hash(password, self.config.bcrypt_cost)?);
            info!("Upgraded legacy password hash for '{}'", username);
        }
        model.last_login_at = Set(Some(now));
        model = model.reset_lockout();
        model
            .update(&txn)
            .await
            .map_err(|e| CatalogError::from_db("record login", e))?;

        let session = admin_sessions::ActiveModel::new(
            username.to_string(),
            self.config.session_ttl_hours,
        )
        .insert(&txn)
        .await
        .map_err(|e| CatalogError::from_db("create session", e))?;

        txn.commit().await?;
        info!("Admin '{}' logged in", username);

        Ok(SessionInfo {
            session_id: session.session_id,
            username: session.username,
            role,
            expires_at: session.expires_at,
        })
    }

    /// Seconds left on an active lock, if any.
    fn remaining_lockout(&self, user: &admin_users::Model, now: DateTime<Utc>) -> Option<i64> {
        let locked =
            user.account_locked || user.failed_attempts >= self.config.lockout_threshold;
        if !locked {
            return None;
        }

        let last_failure = user.last_failed_attempt?;
        let elapsed = (now - last_failure).num_seconds();
        let remaining = self.config.lockout_window_secs - elapsed;
        (remaining > 0).then_some(remaining)
    }

    /// Count a failed attempt. The increment happens in SQL and is read back
    /// in the same transaction, so concurrent failures each see their own
    /// count.
    async fn record_failure(&self, username: &str, now: DateTime<Utc>) -> CatalogError {
        match self.increment_failures(username, now).await {
            Ok(user) if user.account_locked => {
                warn!(
                    "Account '{}' locked after {} failed login attempts",
                    username, user.failed_attempts
                );
                AuthError::AccountLocked {
                    retry_after_secs: self.config.lockout_window_secs,
                }
                .into()
            }
            Ok(user) => {
                info!(
                    "Failed login for '{}' (attempt {})",
                    username, user.failed_attempts
                );
                AuthError::InvalidCredentials.into()
            }
            Err(e) => e,
        }
    }

    async fn increment_failures(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> CatalogResult<admin_users::Model> {
        let txn = self.db.begin().await?;

        admin_users::Entity::update_many()
            .col_expr(
                admin_users::Column::FailedAttempts,
                Expr::col(admin_users::Column::FailedAttempts).add(1),
            )
            .col_expr(
                admin_users::Column::AccountLocked,
                Expr::expr(Expr::col(admin_users::Column::FailedAttempts).add(1))
                    .gte(self.config.lockout_threshold),
            )
            .col_expr(admin_users::Column::LastFailedAttempt, Expr::value(Some(now)))
            .col_expr(admin_users::Column::UpdatedAt, Expr::value(now))
            .filter(admin_users::Column::Username.eq(username))
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("record failed login", e))?;

        let user = admin_users::Entity::find_by_id(username.to_string())
            .one(&txn)
            .await
            .map_err(|e| CatalogError::from_db("record failed login", e))?
            .ok_or(AuthError::InvalidCredentials)?;

        txn.commit().await?;
        Ok(user)
    }

    pub async fn logout(&self, session_id: &str) -> CatalogResult<()> {
        let session = admin_sessions::Entity::find()
            .filter(admin_sessions::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await?
            .ok_or(AuthError::AuthenticationRequired)?;

        let username = session.username.clone();
        let model: admin_sessions::ActiveModel = session.into();
        model
            .deactivate()
            .update(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("end session", e))?;

        info!("Admin '{}' logged out", username);
        Ok(())
    }

    /// Resolve a session token to the admin it belongs to.
    pub async fn authenticate(&self, session_id: &str) -> CatalogResult<AdminActor> {
        let session = admin_sessions::Entity::find()
            .filter(admin_sessions::Column::SessionId.eq(session_id))
            .filter(admin_sessions::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find session", e))?
            .ok_or(AuthError::AuthenticationRequired)?;

        if session.is_expired() {
            return Err(AuthError::SessionExpired.into());
        }

        let user = admin_users::Entity::find_by_id(session.username.clone())
            .one(&self.db)
            .await?
            .ok_or(AuthError::AuthenticationRequired)?;

        let role = user
            .get_role()
            .ok_or_else(|| AuthError::InvalidRole(user.role.clone()))?;

        Ok(AdminActor::new(user.username, role))
    }

    /// Create the `superadmin` account from the configured bootstrap password
    /// when no super admin exists. Returns whether an account was created.
    pub async fn ensure_super_admin(&self) -> CatalogResult<bool> {
        let Some(password) = self.config.bootstrap_password.as_deref() else {
            return Ok(false);
        };

        let txn = self.db.begin().await?;

        let super_admins = admin_users::Entity::find()
            .filter(admin_users::Column::Role.eq(AdminRole::SuperAdmin.as_str()))
            .count(&txn)
            .await?;
        if super_admins > 0 {
            return Ok(false);
        }

        let taken = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&txn)
            .await?
            .is_some();
        if taken {
            warn!(
                "No super admin exists but '{}' is already an admin account; skipping bootstrap",
                BOOTSTRAP_USERNAME
            );
            return Ok(false);
        }

        let hash = Self::hash_password(password, self.config.bcrypt_cost)?;
        admin_users::ActiveModel::new(BOOTSTRAP_USERNAME.to_string(), hash, AdminRole::SuperAdmin)
            .insert(&txn)
            .await
            .map_err(|e| CatalogError::from_db("create bootstrap admin", e))?;

        AuditService::record(
            &txn,
            &AdminActor::system(),
            AuditRecord::new(AuditAction::CreateAdmin, subject::ADMIN_USER).details(json!({
                "username": BOOTSTRAP_USERNAME,
                "role": AdminRole::SuperAdmin.as_str(),
            })),
        )
        .await?;

        txn.commit().await?;
        info!("Created default super admin account '{}'", BOOTSTRAP_USERNAME);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    fn config() -> AuthConfig {
        AuthConfig {
            bcrypt_cost: crate::config::BCRYPT_MIN_COST,
            bootstrap_password: Some("correct horse".to_string()),
            ..AuthConfig::default()
        }
    }

    async fn service_with_admin() -> (AuthService, tempfile::TempDir) {
        let (db, dir) = setup_test_db().await;
        let service = AuthService::new(db, config());
        assert!(service.ensure_super_admin().await.unwrap());
        (service, dir)
    }

    #[test]
    fn legacy_sha256_hashes_verify() {
        let digest = AuthService::legacy_digest("admin123");
        assert_eq!(
            digest,
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
        assert_eq!(
            AuthService::verify_password("admin123", &digest),
            PasswordCheck::MatchNeedsRehash
        );
        assert_eq!(
            AuthService::verify_password("wrong", &digest),
            PasswordCheck::Mismatch
        );
    }

    #[test]
    fn bcrypt_hashes_verify() {
        let hash = AuthService::hash_password("longenough", crate::config::BCRYPT_MIN_COST).unwrap();
        assert_eq!(
            AuthService::verify_password("longenough", &hash),
            PasswordCheck::Match
        );
        assert!(AuthService::hash_password("short", crate::config::BCRYPT_MIN_COST).is_err());
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let (service, _dir) = service_with_admin().await;
        assert!(!service.ensure_super_admin().await.unwrap());
    }

    #[tokio::test]
    async fn login_creates_a_session_that_authenticates() {
        let (service, _dir) = service_with_admin().await;

        let session = service.login(BOOTSTRAP_USERNAME, "correct horse").await.unwrap();
        assert_eq!(session.role, AdminRole::SuperAdmin);

        let actor = service.authenticate(&session.session_id).await.unwrap();
        assert_eq!(actor.username, BOOTSTRAP_USERNAME);
        assert!(actor.is_super_admin());

        service.logout(&session.session_id).await.unwrap();
        let err = service.authenticate(&session.session_id).await.unwrap_err();
        assert_eq!(err.error_code(), "AUTHENTICATION_REQUIRED");
    }

    #[tokio::test]
    async fn unknown_user_is_invalid_credentials() {
        let (service, _dir) = service_with_admin().await;
        let err = service.login("nobody", "whatever1").await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn five_failures_lock_the_account() {
        let (service, _dir) = service_with_admin().await;

        for _ in 0..4 {
            let err = service.login(BOOTSTRAP_USERNAME, "wrong password").await.unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
        }
        let err = service.login(BOOTSTRAP_USERNAME, "wrong password").await.unwrap_err();
        assert_eq!(err.error_code(), "ACCOUNT_LOCKED");

        let user = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert!(user.account_locked);
        assert_eq!(user.failed_attempts, 5);

        // Correct password is rejected while locked and is not counted
        let err = service.login(BOOTSTRAP_USERNAME, "correct horse").await.unwrap_err();
        assert_eq!(err.http_status_code(), 423);
        let user = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_attempts, 5);
    }

    #[tokio::test]
    async fn lock_expires_after_the_window() {
        let (service, _dir) = service_with_admin().await;

        let user = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        let mut model: admin_users::ActiveModel = user.into();
        model.failed_attempts = Set(5);
        model.account_locked = Set(true);
        model.last_failed_attempt = Set(Some(Utc::now() - chrono::Duration::seconds(301)));
        model.update(&service.db).await.unwrap();

        service.login(BOOTSTRAP_USERNAME, "correct horse").await.unwrap();

        let user = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert!(!user.account_locked);
        assert_eq!(user.failed_attempts, 0);
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn legacy_hash_is_upgraded_on_login() {
        let (db, _dir) = setup_test_db().await;
        admin_users::ActiveModel::new(
            "legacy".to_string(),
            AuthService::legacy_digest("old-password"),
            AdminRole::Admin,
        )
        .insert(&db)
        .await
        .unwrap();

        let service = AuthService::new(db.clone(), config());
        service.login("legacy", "old-password").await.unwrap();

        let user = admin_users::Entity::find_by_id("legacy".to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn short_legacy_password_still_logs_in() {
        let (db, _dir) = setup_test_db().await;
        admin_users::ActiveModel::new(
            "veteran".to_string(),
            AuthService::legacy_digest("admin1"),
            AdminRole::SuperAdmin,
        )
        .insert(&db)
        .await
        .unwrap();

        let service = AuthService::new(db.clone(), config());
        let session = service.login("veteran", "admin1").await.unwrap();
        assert_eq!(session.username, "veteran");

        let user = admin_users::Entity::find_by_id("veteran".to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            AuthService::verify_password("admin1", &user.password_hash),
            PasswordCheck::Match
        );
    }

    #[tokio::test]
    async fn concurrent_failures_are_all_counted() {
        let (service, _dir) = service_with_admin().await;
        let threshold = service.config().lockout_threshold;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .login(BOOTSTRAP_USERNAME, &format!("guess number {}", i))
                        .await
                        .unwrap_err()
                        .error_code()
                })
            })
            .collect();

        let mut invalid = 0;
        for handle in handles {
            let code = handle.await.unwrap();
            match code {
                "INVALID_CREDENTIALS" => invalid += 1,
                "ACCOUNT_LOCKED" => {}
                other => panic!("unexpected error code {}", other),
            }
        }
        assert!(invalid <= threshold - 1, "{} guesses evaluated unlocked", invalid);

        let user = admin_users::Entity::find_by_id(BOOTSTRAP_USERNAME.to_string())
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert!(user.account_locked);
        assert!(user.failed_attempts >= threshold);
    }
}
