use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub session_id: String,
    pub username: String,
    pub created_at: ChronoDateTimeUtc,
    pub expires_at: ChronoDateTimeUtc,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin_users::Entity",
        from = "Column::Username",
        to = "super::admin_users::Column::Username",
        on_delete = "Cascade"
    )]
    AdminUsers,
}

impl Related<super::admin_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(username: String, ttl_hours: i64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ActiveValue::NotSet,
            session_id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(username),
            created_at: Set(now),
            expires_at: Set(now + chrono::Duration::hours(ttl_hours)),
            is_active: Set(true),
        }
    }

    pub fn deactivate(mut self) -> Self {
        self.is_active = Set(false);
        self
    }
}

impl Model {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() > self.expires_at
    }
}
