use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::{AdminAction, AdminActor, AdminRole};
use crate::database::entities::admin_users;
use crate::database::entities::audit_log::{subject, AuditAction};
use crate::errors::{AuthError, CatalogError, CatalogResult};
use crate::services::audit_service::{AuditRecord, AuditService};
use crate::services::auth_service::AuthService;
use crate::services::ValidationService;

/// Admin account as shown to other admins; never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct AdminView {
    pub username: String,
    pub role: AdminRole,
    pub failed_attempts: i32,
    pub account_locked: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminView {
    fn from_model(model: admin_users::Model) -> CatalogResult<Self> {
        let role = model
            .get_role()
            .ok_or_else(|| AuthError::InvalidRole(model.role.clone()))?;
        Ok(Self {
            username: model.username,
            role,
            failed_attempts: model.failed_attempts,
            account_locked: model.account_locked,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
        })
    }
}

#[derive(Clone)]
pub struct AdminService {
    db: DatabaseConnection,
    bcrypt_cost: u32,
}

impl AdminService {
    pub fn new(db: DatabaseConnection, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    pub async fn list_admins(&self, actor: &AdminActor) -> CatalogResult<Vec<AdminView>> {
        actor.require(AdminAction::ManageAdmins)?;

        admin_users::Entity::find()
            .order_by_asc(admin_users::Column::Username)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list admins", e))?
            .into_iter()
            .map(AdminView::from_model)
            .collect()
    }

    pub async fn create_admin(
        &self,
        actor: &AdminActor,
        username: &str,
        password: &str,
        role: AdminRole,
    ) -> CatalogResult<AdminView> {
        actor.require(AdminAction::ManageAdmins)?;
        ValidationService::validate_username(username)?;
        let hash = AuthService::hash_password(password, self.bcrypt_cost)?;

        let txn = self.db.begin().await?;

        if admin_users::Entity::find_by_id(username.to_string())
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(AuthError::UserAlreadyExists(username.to_string()).into());
        }

        let admin = admin_users::ActiveModel::new(username.to_string(), hash, role)
            .insert(&txn)
            .await
            .map_err(|e| CatalogError::from_db("create admin", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::CreateAdmin, subject::ADMIN_USER)
                .details(json!({ "username": username, "role": role.as_str() })),
        )
        .await?;

        txn.commit().await?;
        info!("Admin '{}' ({}) created by {}", username, role.as_str(), actor.username);
        AdminView::from_model(admin)
    }

    /// Set a new password. Super admins may reset anyone; other admins only
    /// themselves. Clears any lockout.
    pub async fn reset_password(
        &self,
        actor: &AdminActor,
        username: &str,
        new_password: &str,
    ) -> CatalogResult<()> {
        if actor.username != username {
            actor.require(AdminAction::ManageAdmins)?;
        }
        let hash = AuthService::hash_password(new_password, self.bcrypt_cost)?;

        let txn = self.db.begin().await?;

        let admin = Self::find_admin(&txn, username).await?;
        let mut model: admin_users::ActiveModel = admin.into();
        model.password_hash = Set(hash);
        model
            .reset_lockout()
            .update(&txn)
            .await
            .map_err(|e| CatalogError::from_db("reset password", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::ResetPassword, subject::ADMIN_USER)
                .details(json!({ "username": username })),
        )
        .await?;

        txn.commit().await?;
        info!("Password for '{}' reset by {}", username, actor.username);
        Ok(())
    }

    pub async fn unlock_admin(&self, actor: &AdminActor, username: &str) -> CatalogResult<AdminView> {
        actor.require(AdminAction::ManageAdmins)?;

        let txn = self.db.begin().await?;

        let admin = Self::find_admin(&txn, username).await?;
        let previous_attempts = admin.failed_attempts;
        let model: admin_users::ActiveModel = admin.into();
        let admin = model
            .reset_lockout()
            .update(&txn)
            .await
            .map_err(|e| CatalogError::from_db("unlock admin", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::UnlockAdmin, subject::ADMIN_USER).details(json!({
                "username": username,
                "failed_attempts": previous_attempts,
            })),
        )
        .await?;

        txn.commit().await?;
        info!("Admin '{}' unlocked by {}", username, actor.username);
        AdminView::from_model(admin)
    }

    /// Delete an admin account and its sessions.
    pub async fn delete_admin(&self, actor: &AdminActor, username: &str) -> CatalogResult<()> {
        actor.require(AdminAction::ManageAdmins)?;
        if actor.username == username {
            return Err(AuthError::CannotDeleteSelf.into());
        }

        let txn = self.db.begin().await?;

        let admin = Self::find_admin(&txn, username).await?;
        if admin.get_role() == Some(AdminRole::SuperAdmin) {
            let super_admins = admin_users::Entity::find()
                .filter(admin_users::Column::Role.eq(AdminRole::SuperAdmin.as_str()))
                .count(&txn)
                .await?;
            if super_admins <= 1 {
                return Err(AuthError::LastSuperAdmin.into());
            }
        }

        admin_users::Entity::delete_by_id(username.to_string())
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("delete admin", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::DeleteAdmin, subject::ADMIN_USER)
                .details(json!({ "username": username, "role": admin.role })),
        )
        .await?;

        txn.commit().await?;
        info!("Admin '{}' deleted by {}", username, actor.username);
        Ok(())
    }

    async fn find_admin<C: sea_orm::ConnectionTrait>(
        conn: &C,
        username: &str,
    ) -> CatalogResult<admin_users::Model> {
        admin_users::Entity::find_by_id(username.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::{admin_sessions, audit_log};
    use crate::database::test_utils::setup_test_db;

    fn root() -> AdminActor {
        AdminActor::new("root", AdminRole::SuperAdmin)
    }

    async fn service() -> (AdminService, DatabaseConnection, tempfile::TempDir) {
        let (db, dir) = setup_test_db().await;
        let service = AdminService::new(db.clone(), crate::config::BCRYPT_MIN_COST);
        service
            .create_admin(&AdminActor::system(), "root", "rootpassword", AdminRole::SuperAdmin)
            .await
            .unwrap();
        (service, db, dir)
    }

    #[tokio::test]
    async fn create_and_list_admins() {
        let (service, db, _dir) = service().await;

        let alice = service
            .create_admin(&root(), "alice", "alicepassword", AdminRole::Admin)
            .await
            .unwrap();
        assert_eq!(alice.role, AdminRole::Admin);

        let err = service
            .create_admin(&root(), "alice", "alicepassword", AdminRole::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "USER_ALREADY_EXISTS");

        let admins = service.list_admins(&root()).await.unwrap();
        let names: Vec<_> = admins.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "root"]);

        let rows = audit_log::Entity::find()
            .filter(audit_log::Column::ActionType.eq("create_admin"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].admin_role, "system");
    }

    #[tokio::test]
    async fn admins_cannot_manage_admins() {
        let (service, _db, _dir) = service().await;
        let alice = AdminActor::new("alice", AdminRole::Admin);

        let err = service.list_admins(&alice).await.unwrap_err();
        assert_eq!(err.http_status_code(), 403);

        let err = service
            .create_admin(&alice, "bob", "bobpassword", AdminRole::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_may_reset_own_password_only() {
        let (service, _db, _dir) = service().await;
        service
            .create_admin(&root(), "alice", "alicepassword", AdminRole::Admin)
            .await
            .unwrap();
        let alice = AdminActor::new("alice", AdminRole::Admin);

        service.reset_password(&alice, "alice", "newpassword").await.unwrap();
        assert!(service.reset_password(&alice, "root", "newpassword").await.is_err());
    }

    #[tokio::test]
    async fn unlock_clears_the_lockout() {
        let (service, db, _dir) = service().await;
        service
            .create_admin(&root(), "alice", "alicepassword", AdminRole::Admin)
            .await
            .unwrap();

        let user = admin_users::Entity::find_by_id("alice".to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut model: admin_users::ActiveModel = user.into();
        model.failed_attempts = Set(5);
        model.account_locked = Set(true);
        model.last_failed_attempt = Set(Some(Utc::now()));
        model.update(&db).await.unwrap();

        let view = service.unlock_admin(&root(), "alice").await.unwrap();
        assert!(!view.account_locked);
        assert_eq!(view.failed_attempts, 0);
    }

    #[tokio::test]
    async fn delete_rules() {
        let (service, db, _dir) = service().await;
        service
            .create_admin(&root(), "alice", "alicepassword", AdminRole::Admin)
            .await
            .unwrap();
        admin_sessions::ActiveModel::new("alice".to_string(), 24)
            .insert(&db)
            .await
            .unwrap();

        let err = service.delete_admin(&root(), "root").await.unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_DELETE_SELF");

        let err = service
            .delete_admin(&AdminActor::system(), "root")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "LAST_SUPER_ADMIN");

        let err = service.delete_admin(&root(), "ghost").await.unwrap_err();
        assert_eq!(err.http_status_code(), 404);

        service.delete_admin(&root(), "alice").await.unwrap();
        assert_eq!(admin_sessions::Entity::find().count(&db).await.unwrap(), 0);
    }
}
