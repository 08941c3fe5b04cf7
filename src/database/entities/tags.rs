use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entity_tags::Entity")]
    EntityTags,
}

impl Related<super::entity_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntityTags.def()
    }
}

impl Related<super::catalog_entities::Entity> for Entity {
    fn to() -> RelationDef {
        super::entity_tags::Relation::Entities.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::entity_tags::Relation::Tags.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(name: String) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: Set(name),
            created_at: Set(chrono::Utc::now()),
        }
    }
}
