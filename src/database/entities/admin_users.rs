use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::auth::AdminRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub failed_attempts: i32,
    pub last_failed_attempt: Option<ChronoDateTimeUtc>,
    pub account_locked: bool,
    pub last_login_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::admin_sessions::Entity")]
    AdminSessions,
}

impl Related<super::admin_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(username: String, password_hash: String, role: AdminRole) -> Self {
        let now = chrono::Utc::now();
        Self {
            username: Set(username),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            failed_attempts: Set(0),
            last_failed_attempt: Set(None),
            account_locked: Set(false),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    pub fn set_updated_at(mut self) -> Self {
        self.updated_at = Set(chrono::Utc::now());
        self
    }

    /// Clear the failure counter and the lock.
    pub fn reset_lockout(mut self) -> Self {
        self.failed_attempts = Set(0);
        self.last_failed_attempt = Set(None);
        self.account_locked = Set(false);
        self.set_updated_at()
    }
}

impl Model {
    pub fn get_role(&self) -> Option<AdminRole> {
        AdminRole::from_str(&self.role)
    }
}
