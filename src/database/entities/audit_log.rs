use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Append-only record of an administrative mutation. Rows are never updated
/// and `entity_id` is not a foreign key, so entries outlive what they describe.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema), schema(as = AuditLogEntry))]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub admin_user: String,
    pub admin_role: String,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub details: Option<Json>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(admin_user: String, admin_role: String, action: AuditAction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            admin_user: Set(admin_user),
            admin_role: Set(admin_role),
            action_type: Set(action.as_str().to_string()),
            entity_type: Set(None),
            entity_id: Set(None),
            details: Set(None),
            created_at: Set(chrono::Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    CreateEntity,
    UpdateEntity,
    DeleteEntity,
    BulkDelete,
    CreateRelationship,
    UpdateRelationship,
    DeleteRelationship,
    CreateTag,
    DeleteTag,
    CreateAdmin,
    ResetPassword,
    UnlockAdmin,
    DeleteAdmin,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateEntity => "create_entity",
            AuditAction::UpdateEntity => "update_entity",
            AuditAction::DeleteEntity => "delete_entity",
            AuditAction::BulkDelete => "bulk_delete",
            AuditAction::CreateRelationship => "create_relationship",
            AuditAction::UpdateRelationship => "update_relationship",
            AuditAction::DeleteRelationship => "delete_relationship",
            AuditAction::CreateTag => "create_tag",
            AuditAction::DeleteTag => "delete_tag",
            AuditAction::CreateAdmin => "create_admin",
            AuditAction::ResetPassword => "reset_password",
            AuditAction::UnlockAdmin => "unlock_admin",
            AuditAction::DeleteAdmin => "delete_admin",
        }
    }
}

/// Values of the `entity_type` column.
pub mod subject {
    pub const ENTITY: &str = "entity";
    pub const RELATIONSHIP: &str = "relationship";
    pub const TAG: &str = "tag";
    pub const ADMIN_USER: &str = "admin_user";
}
