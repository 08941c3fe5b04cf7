use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A catalog node: capability, use case, tool or product.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub entity_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub metadata: Option<Json>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
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

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::entity_tags::Relation::Tags.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::entity_tags::Relation::Entities.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(name: String, entity_type: EntityType) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ActiveValue::NotSet,
            name: Set(name),
            entity_type: Set(entity_type.as_str().to_string()),
            description: Set(None),
            metadata: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    pub fn set_updated_at(mut self) -> Self {
        self.updated_at = Set(chrono::Utc::now());
        self
    }
}

impl Model {
    pub fn get_entity_type(&self) -> Option<EntityType> {
        EntityType::from_str(&self.entity_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Capability,
    UseCase,
    Tool,
    Product,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Capability,
        EntityType::UseCase,
        EntityType::Tool,
        EntityType::Product,
    ];

    /// Stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Capability => "capability",
            EntityType::UseCase => "use case",
            EntityType::Tool => "tool",
            EntityType::Product => "product",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EntityType::Capability => "Capability",
            EntityType::UseCase => "Use Case",
            EntityType::Tool => "Tool",
            EntityType::Product => "Product",
        }
    }

    /// Accepts the stored form, the display form and `use_case`, in any case.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "capability" => Some(EntityType::Capability),
            "use case" | "usecase" => Some(EntityType::UseCase),
            "tool" => Some(EntityType::Tool),
            "product" => Some(EntityType::Product),
            _ => None,
        }
    }

    /// Node colour in the graph view.
    pub fn color(&self) -> &'static str {
        match self {
            EntityType::Capability => "#ff7f0e",
            EntityType::UseCase => "#1f77b4",
            EntityType::Tool => "#2ca02c",
            EntityType::Product => "#d62728",
        }
    }
}
