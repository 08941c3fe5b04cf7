use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "relationships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_id: i32,
    pub target_id: i32,
    pub relationship_type: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog_entities::Entity",
        from = "Column::SourceId",
        to = "super::catalog_entities::Column::Id",
        on_delete = "Cascade"
    )]
    Source,
    #[sea_orm(
        belongs_to = "super::catalog_entities::Entity",
        from = "Column::TargetId",
        to = "super::catalog_entities::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(source_id: i32, target_id: i32, relationship_type: RelationshipType) -> Self {
        Self {
            id: ActiveValue::NotSet,
            source_id: Set(source_id),
            target_id: Set(target_id),
            relationship_type: Set(relationship_type.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    Enables,
    ImplementedBy,
    Uses,
    Supports,
    PoweredBy,
    Delivers,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 6] = [
        RelationshipType::Enables,
        RelationshipType::ImplementedBy,
        RelationshipType::Uses,
        RelationshipType::Supports,
        RelationshipType::PoweredBy,
        RelationshipType::Delivers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Enables => "enables",
            RelationshipType::ImplementedBy => "implemented by",
            RelationshipType::Uses => "uses",
            RelationshipType::Supports => "supports",
            RelationshipType::PoweredBy => "powered by",
            RelationshipType::Delivers => "delivers",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', " ").as_str() {
            "enables" => Some(RelationshipType::Enables),
            "implemented by" => Some(RelationshipType::ImplementedBy),
            "uses" => Some(RelationshipType::Uses),
            "supports" => Some(RelationshipType::Supports),
            "powered by" => Some(RelationshipType::PoweredBy),
            "delivers" => Some(RelationshipType::Delivers),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relationship_types() {
        assert_eq!(
            RelationshipType::from_str("implemented_by"),
            Some(RelationshipType::ImplementedBy)
        );
        assert_eq!(
            RelationshipType::from_str("Powered By"),
            Some(RelationshipType::PoweredBy)
        );
        assert_eq!(RelationshipType::from_str("depends on"), None);
    }
}
