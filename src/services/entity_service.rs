use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{AdminAction, AdminActor};
use crate::database::entities::audit_log::{subject, AuditAction};
use crate::database::entities::{catalog_entities, entity_tags, relationships, tags, EntityType};
use crate::errors::{CatalogError, CatalogResult};
use crate::services::audit_service::{AuditRecord, AuditService};
use crate::services::{TagService, ValidationService};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct EntityInput {
    pub name: String,
    #[serde(alias = "type")]
    pub entity_type: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update; absent fields are left unchanged. An empty description
/// clears it and `tags` replaces the whole tag set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct EntityUpdate {
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub entity_type: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct EntityView {
    pub id: i32,
    pub name: String,
    pub entity_type: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityView {
    fn from_model(model: catalog_entities::Model, tags: Vec<String>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            entity_type: model.entity_type,
            description: model.description,
            metadata: model.metadata,
            tags,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A relationship seen from one of its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct EntityRelationship {
    pub relationship_id: i32,
    pub relationship_type: String,
    pub related_entity_id: i32,
    pub related_entity_name: String,
    pub related_entity_type: String,
    /// True when the viewed entity is the source of the relationship
    pub is_source: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct EntityDetail {
    pub entity: EntityView,
    pub relationships: Vec<EntityRelationship>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub enum SearchField {
    #[default]
    Name,
    Description,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub entity_type: Option<EntityType>,
    pub search: Option<String>,
    pub search_in: SearchField,
    /// Match entities carrying any of these tags
    pub tags: Vec<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct EntityService {
    db: DatabaseConnection,
}

impl EntityService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_entity(
        &self,
        actor: &AdminActor,
        input: EntityInput,
    ) -> CatalogResult<EntityView> {
        actor.require(AdminAction::ManageCatalog)?;

        let name = ValidationService::validate_entity_name(&input.name)?;
        let entity_type = ValidationService::parse_entity_type(&input.entity_type)?;
        if let Some(metadata) = &input.metadata {
            ValidationService::validate_metadata(metadata)?;
        }
        let tag_names = ValidationService::normalize_tags(&input.tags)?;

        let txn = self.db.begin().await?;

        let mut model = catalog_entities::ActiveModel::new(name, entity_type);
        model.description = Set(ValidationService::normalize_description(
            input.description.as_deref(),
        ));
        model.metadata = Set(input.metadata.filter(|m| !m.is_null()));

        let entity = model
            .insert(&txn)
            .await
            .map_err(|e| CatalogError::from_db("create entity", e))?;

        let tags = Self::replace_tags(&txn, entity.id, &tag_names).await?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::CreateEntity, subject::ENTITY)
                .entity_id(entity.id)
                .details(json!({
                    "name": entity.name,
                    "type": entity.entity_type,
                    "tags": tags,
                })),
        )
        .await?;

        txn.commit().await?;
        info!(
            "Entity {} '{}' ({}) created by {}",
            entity.id, entity.name, entity.entity_type, actor.username
        );

        Ok(EntityView::from_model(entity, tags))
    }

    pub async fn get_entity(&self, id: i32) -> CatalogResult<EntityDetail> {
        let entity = catalog_entities::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("get entity", e))?
            .ok_or_else(|| CatalogError::not_found("entity", id))?;

        let mut tags = TagService::tags_for_entities(&self.db, &[id]).await?;

        let edges = relationships::Entity::find()
            .filter(
                Condition::any()
                    .add(relationships::Column::SourceId.eq(id))
                    .add(relationships::Column::TargetId.eq(id)),
            )
            .order_by_asc(relationships::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("get entity relationships", e))?;

        let related_ids: BTreeSet<i32> = edges
            .iter()
            .map(|edge| if edge.source_id == id { edge.target_id } else { edge.source_id })
            .collect();
        let related: HashMap<i32, catalog_entities::Model> = catalog_entities::Entity::find()
            .filter(catalog_entities::Column::Id.is_in(related_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let relationships = edges
            .into_iter()
            .filter_map(|edge| {
                let is_source = edge.source_id == id;
                let other_id = if is_source { edge.target_id } else { edge.source_id };
                related.get(&other_id).map(|other| EntityRelationship {
                    relationship_id: edge.id,
                    relationship_type: edge.relationship_type,
                    related_entity_id: other.id,
                    related_entity_name: other.name.clone(),
                    related_entity_type: other.entity_type.clone(),
                    is_source,
                })
            })
            .collect();

        Ok(EntityDetail {
            entity: EntityView::from_model(entity, tags.remove(&id).unwrap_or_default()),
            relationships,
        })
    }

    pub async fn list_entities(&self, filter: &EntityFilter) -> CatalogResult<Vec<EntityView>> {
        let mut query = catalog_entities::Entity::find();

        if let Some(entity_type) = filter.entity_type {
            query = query.filter(catalog_entities::Column::EntityType.eq(entity_type.as_str()));
        }

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            let name_matches = Expr::expr(Func::lower(Expr::col((
                catalog_entities::Entity,
                catalog_entities::Column::Name,
            ))))
            .like(pattern.clone());
            let description_matches = Expr::expr(Func::lower(Expr::col((
                catalog_entities::Entity,
                catalog_entities::Column::Description,
            ))))
            .like(pattern);

            query = match filter.search_in {
                SearchField::Name => query.filter(name_matches),
                SearchField::Description => query.filter(description_matches),
                SearchField::All => query.filter(
                    Condition::any().add(name_matches).add(description_matches),
                ),
            };
        }

        if let Some(after) = filter.created_after {
            query = query.filter(catalog_entities::Column::CreatedAt.gte(after));
        }
        if let Some(before) = filter.created_before {
            query = query.filter(catalog_entities::Column::CreatedAt.lte(before));
        }

        if !filter.tags.is_empty() {
            let entity_ids = self.entity_ids_with_any_tag(&filter.tags).await?;
            if entity_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(catalog_entities::Column::Id.is_in(entity_ids));
        }

        let entities = query
            .order_by_asc(catalog_entities::Column::Name)
            .order_by_asc(catalog_entities::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list entities", e))?;

        let ids: Vec<i32> = entities.iter().map(|e| e.id).collect();
        let mut tags = TagService::tags_for_entities(&self.db, &ids).await?;

        Ok(entities
            .into_iter()
            .map(|entity| {
                let entity_tags = tags.remove(&entity.id).unwrap_or_default();
                EntityView::from_model(entity, entity_tags)
            })
            .collect())
    }

    pub async fn update_entity(
        &self,
        actor: &AdminActor,
        id: i32,
        update: EntityUpdate,
    ) -> CatalogResult<EntityView> {
        actor.require(AdminAction::ManageCatalog)?;
        let new_tags = update
            .tags
            .as_deref()
            .map(ValidationService::normalize_tags)
            .transpose()?;

        let txn = self.db.begin().await?;

        let existing = catalog_entities::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CatalogError::not_found("entity", id))?;

        let mut changes: Vec<&str> = Vec::new();
        let mut model: catalog_entities::ActiveModel = existing.clone().into();

        if let Some(name) = &update.name {
            let name = ValidationService::validate_entity_name(name)?;
            if name != existing.name {
                model.name = Set(name);
                changes.push("name");
            }
        }
        if let Some(entity_type) = &update.entity_type {
            let entity_type = ValidationService::parse_entity_type(entity_type)?;
            if entity_type.as_str() != existing.entity_type {
                model.entity_type = Set(entity_type.as_str().to_string());
                changes.push("type");
            }
        }
        if let Some(description) = &update.description {
            let description = ValidationService::normalize_description(Some(description));
            if description != existing.description {
                model.description = Set(description);
                changes.push("description");
            }
        }
        if let Some(metadata) = &update.metadata {
            ValidationService::validate_metadata(metadata)?;
            let metadata = Some(metadata.clone()).filter(|m| !m.is_null());
            if metadata != existing.metadata {
                model.metadata = Set(metadata);
                changes.push("metadata");
            }
        }

        let entity = model
            .set_updated_at()
            .update(&txn)
            .await
            .map_err(|e| CatalogError::from_db("update entity", e))?;

        let tags = match &new_tags {
            Some(tag_names) => {
                changes.push("tags");
                Self::replace_tags(&txn, id, tag_names).await?
            }
            None => TagService::tags_for_entities(&txn, &[id])
                .await?
                .remove(&id)
                .unwrap_or_default(),
        };

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::UpdateEntity, subject::ENTITY)
                .entity_id(id)
                .details(json!({
                    "name": entity.name,
                    "changes": changes,
                })),
        )
        .await?;

        txn.commit().await?;
        info!("Entity {} updated by {}: {:?}", id, actor.username, changes);

        Ok(EntityView::from_model(entity, tags))
    }

    /// Delete an entity; its relationships and tag associations cascade.
    pub async fn delete_entity(&self, actor: &AdminActor, id: i32) -> CatalogResult<()> {
        actor.require(AdminAction::ManageCatalog)?;

        let txn = self.db.begin().await?;

        let entity = catalog_entities::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CatalogError::not_found("entity", id))?;

        catalog_entities::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("delete entity", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::DeleteEntity, subject::ENTITY)
                .entity_id(id)
                .details(json!({
                    "name": entity.name,
                    "type": entity.entity_type,
                })),
        )
        .await?;

        txn.commit().await?;
        info!("Entity {} '{}' deleted by {}", id, entity.name, actor.username);
        Ok(())
    }

    /// Delete several entities at once. Ids that do not exist are skipped;
    /// returns the number deleted.
    pub async fn bulk_delete_entities(&self, actor: &AdminActor, ids: &[i32]) -> CatalogResult<u64> {
        actor.require(AdminAction::BulkDelete)?;

        if ids.is_empty() {
            return Err(CatalogError::validation("No entities selected for deletion"));
        }

        let txn = self.db.begin().await?;

        let found = catalog_entities::Entity::find()
            .filter(catalog_entities::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(catalog_entities::Column::Id)
            .all(&txn)
            .await?;

        if found.is_empty() {
            let requested = ids.iter().map(i32::to_string).collect::<Vec<_>>().join(", ");
            return Err(CatalogError::not_found("entities", requested));
        }

        let found_ids: Vec<i32> = found.iter().map(|e| e.id).collect();
        let names: Vec<&str> = found.iter().map(|e| e.name.as_str()).collect();

        let result = catalog_entities::Entity::delete_many()
            .filter(catalog_entities::Column::Id.is_in(found_ids.clone()))
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("bulk delete entities", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::BulkDelete, subject::ENTITY).details(json!({
                "count": result.rows_affected,
                "ids": found_ids,
                "names": names,
            })),
        )
        .await?;

        txn.commit().await?;
        info!(
            "Bulk deleted {} entities by {}",
            result.rows_affected, actor.username
        );
        Ok(result.rows_affected)
    }

    async fn entity_ids_with_any_tag(&self, tag_names: &[String]) -> CatalogResult<Vec<i32>> {
        let tag_ids: Vec<i32> = tags::Entity::find()
            .filter(tags::Column::Name.is_in(tag_names.iter().cloned()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entity_ids: BTreeSet<i32> = entity_tags::Entity::find()
            .filter(entity_tags::Column::TagId.is_in(tag_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|link| link.entity_id)
            .collect();

        Ok(entity_ids.into_iter().collect())
    }

    /// Replace the tag set of an entity, returning the sorted tag names.
    async fn replace_tags<C: ConnectionTrait>(
        conn: &C,
        entity_id: i32,
        tag_names: &[String],
    ) -> CatalogResult<Vec<String>> {
        entity_tags::Entity::delete_many()
            .filter(entity_tags::Column::EntityId.eq(entity_id))
            .exec(conn)
            .await?;

        let tags = TagService::get_or_create_tags(conn, tag_names).await?;
        for tag in &tags {
            entity_tags::ActiveModel::new(entity_id, tag.id)
                .insert(conn)
                .await
                .map_err(|e| CatalogError::from_db("tag entity", e))?;
        }

        let mut names: Vec<String> = tags.into_iter().map(|t| t.name).collect();
        names.sort();
        Ok(names)
    }
}
