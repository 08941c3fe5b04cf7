use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::{AdminAction, AdminActor};
use crate::database::entities::audit_log::{subject, AuditAction};
use crate::database::entities::{catalog_entities, relationships, EntityType, RelationshipType};
use crate::errors::{CatalogError, CatalogResult};
use crate::services::audit_service::{AuditRecord, AuditService};
use crate::services::ValidationService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct RelationshipInput {
    pub source_id: i32,
    pub target_id: i32,
    pub relationship_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct RelationshipUpdate {
    pub source_id: Option<i32>,
    pub target_id: Option<i32>,
    pub relationship_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct RelationshipView {
    pub id: i32,
    pub source_id: i32,
    pub source_name: String,
    pub source_type: String,
    pub target_id: i32,
    pub target_name: String,
    pub target_type: String,
    pub relationship_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipFilter {
    /// Keep relationships where either endpoint has this type
    pub entity_type: Option<EntityType>,
    /// Case-insensitive match on either endpoint name
    pub search: Option<String>,
    pub relationship_types: Vec<RelationshipType>,
}

#[derive(Clone)]
pub struct RelationshipService {
    db: DatabaseConnection,
}

impl RelationshipService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_relationship(
        &self,
        actor: &AdminActor,
        input: RelationshipInput,
    ) -> CatalogResult<RelationshipView> {
        actor.require(AdminAction::ManageCatalog)?;
        let relationship_type = ValidationService::parse_relationship_type(&input.relationship_type)?;

        let txn = self.db.begin().await?;

        let (source, target) =
            Self::load_endpoints(&txn, input.source_id, input.target_id).await?;
        Self::ensure_unique(&txn, source.id, target.id, relationship_type, None).await?;

        let relationship = relationships::ActiveModel::new(source.id, target.id, relationship_type)
            .insert(&txn)
            .await
            .map_err(|e| CatalogError::from_db("create relationship", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::CreateRelationship, subject::RELATIONSHIP)
                .entity_id(relationship.id)
                .details(json!({
                    "source": source.name,
                    "target": target.name,
                    "relationship_type": relationship.relationship_type,
                })),
        )
        .await?;

        txn.commit().await?;
        info!(
            "Relationship {} '{}' {} '{}' created by {}",
            relationship.id, source.name, relationship.relationship_type, target.name, actor.username
        );

        Ok(Self::view(relationship, &source, &target))
    }

    pub async fn get_relationship(&self, id: i32) -> CatalogResult<RelationshipView> {
        let relationship = relationships::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("get relationship", e))?
            .ok_or_else(|| CatalogError::not_found("relationship", id))?;

        let (source, target) =
            Self::load_endpoints(&self.db, relationship.source_id, relationship.target_id).await?;
        Ok(Self::view(relationship, &source, &target))
    }

    /// Relationships with endpoint names, newest first.
    pub async fn list_relationships(
        &self,
        filter: &RelationshipFilter,
    ) -> CatalogResult<Vec<RelationshipView>> {
        let mut query = relationships::Entity::find();
        if !filter.relationship_types.is_empty() {
            query = query.filter(
                relationships::Column::RelationshipType
                    .is_in(filter.relationship_types.iter().map(|t| t.as_str())),
            );
        }

        let rows = query
            .order_by_desc(relationships::Column::CreatedAt)
            .order_by_desc(relationships::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list relationships", e))?;

        let endpoint_ids: BTreeSet<i32> = rows
            .iter()
            .flat_map(|r| [r.source_id, r.target_id])
            .collect();
        let entities: HashMap<i32, catalog_entities::Model> = catalog_entities::Entity::find()
            .filter(catalog_entities::Column::Id.is_in(endpoint_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let source = entities.get(&r.source_id)?;
                let target = entities.get(&r.target_id)?;

                if let Some(entity_type) = filter.entity_type {
                    let wanted = entity_type.as_str();
                    if source.entity_type != wanted && target.entity_type != wanted {
                        return None;
                    }
                }
                if let Some(term) = &search {
                    if !source.name.to_lowercase().contains(term)
                        && !target.name.to_lowercase().contains(term)
                    {
                        return None;
                    }
                }

                Some(Self::view(r, source, target))
            })
            .collect())
    }

    pub async fn update_relationship(
        &self,
        actor: &AdminActor,
        id: i32,
        update: RelationshipUpdate,
    ) -> CatalogResult<RelationshipView> {
        actor.require(AdminAction::ManageCatalog)?;
        let new_type = update
            .relationship_type
            .as_deref()
            .map(ValidationService::parse_relationship_type)
            .transpose()?;

        let txn = self.db.begin().await?;

        let existing = relationships::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CatalogError::not_found("relationship", id))?;

        let source_id = update.source_id.unwrap_or(existing.source_id);
        let target_id = update.target_id.unwrap_or(existing.target_id);
        let relationship_type = match new_type {
            Some(t) => t,
            None => ValidationService::parse_relationship_type(&existing.relationship_type)?,
        };

        let (source, target) = Self::load_endpoints(&txn, source_id, target_id).await?;
        Self::ensure_unique(&txn, source_id, target_id, relationship_type, Some(id)).await?;

        let previous_type = existing.relationship_type.clone();
        let mut model: relationships::ActiveModel = existing.into();
        model.source_id = Set(source_id);
        model.target_id = Set(target_id);
        model.relationship_type = Set(relationship_type.as_str().to_string());

        let relationship = model
            .update(&txn)
            .await
            .map_err(|e| CatalogError::from_db("update relationship", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::UpdateRelationship, subject::RELATIONSHIP)
                .entity_id(id)
                .details(json!({
                    "source": source.name,
                    "target": target.name,
                    "old_type": previous_type,
                    "new_type": relationship.relationship_type,
                })),
        )
        .await?;

        txn.commit().await?;
        info!("Relationship {} updated by {}", id, actor.username);

        Ok(Self::view(relationship, &source, &target))
    }

    pub async fn delete_relationship(&self, actor: &AdminActor, id: i32) -> CatalogResult<()> {
        actor.require(AdminAction::ManageCatalog)?;

        let txn = self.db.begin().await?;

        let relationship = relationships::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CatalogError::not_found("relationship", id))?;

        relationships::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("delete relationship", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::DeleteRelationship, subject::RELATIONSHIP)
                .entity_id(id)
                .details(json!({
                    "source_id": relationship.source_id,
                    "target_id": relationship.target_id,
                    "relationship_type": relationship.relationship_type,
                })),
        )
        .await?;

        txn.commit().await?;
        info!("Relationship {} deleted by {}", id, actor.username);
        Ok(())
    }

    pub async fn bulk_delete_relationships(
        &self,
        actor: &AdminActor,
        ids: &[i32],
    ) -> CatalogResult<u64> {
        actor.require(AdminAction::BulkDelete)?;

        if ids.is_empty() {
            return Err(CatalogError::validation(
                "No relationships selected for deletion",
            ));
        }

        let txn = self.db.begin().await?;

        let found_ids: Vec<i32> = relationships::Entity::find()
            .filter(relationships::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(relationships::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        if found_ids.is_empty() {
            let requested = ids.iter().map(i32::to_string).collect::<Vec<_>>().join(", ");
            return Err(CatalogError::not_found("relationships", requested));
        }

        let result = relationships::Entity::delete_many()
            .filter(relationships::Column::Id.is_in(found_ids.clone()))
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("bulk delete relationships", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::BulkDelete, subject::RELATIONSHIP).details(json!({
                "count": result.rows_affected,
                "ids": found_ids,
            })),
        )
        .await?;

        txn.commit().await?;
        info!(
            "Bulk deleted {} relationships by {}",
            result.rows_affected, actor.username
        );
        Ok(result.rows_affected)
    }

    async fn load_endpoints<C: ConnectionTrait>(
        conn: &C,
        source_id: i32,
        target_id: i32,
    ) -> CatalogResult<(catalog_entities::Model, catalog_entities::Model)> {
        if source_id == target_id {
            return Err(CatalogError::validation(
                "A relationship cannot connect an entity to itself",
            ));
        }

        let source = catalog_entities::Entity::find_by_id(source_id)
            .one(conn)
            .await?
            .ok_or_else(|| CatalogError::not_found("entity", source_id))?;
        let target = catalog_entities::Entity::find_by_id(target_id)
            .one(conn)
            .await?
            .ok_or_else(|| CatalogError::not_found("entity", target_id))?;

        Ok((source, target))
    }

    async fn ensure_unique<C: ConnectionTrait>(
        conn: &C,
        source_id: i32,
        target_id: i32,
        relationship_type: RelationshipType,
        ignore_id: Option<i32>,
    ) -> CatalogResult<()> {
        let mut query = relationships::Entity::find()
            .filter(relationships::Column::SourceId.eq(source_id))
            .filter(relationships::Column::TargetId.eq(target_id))
            .filter(relationships::Column::RelationshipType.eq(relationship_type.as_str()));
        if let Some(id) = ignore_id {
            query = query.filter(relationships::Column::Id.ne(id));
        }

        if query.one(conn).await?.is_some() {
            return Err(CatalogError::conflict(format!(
                "Relationship {} -[{}]-> {} already exists",
                source_id,
                relationship_type.as_str(),
                target_id
            )));
        }
        Ok(())
    }

    fn view(
        relationship: relationships::Model,
        source: &catalog_entities::Model,
        target: &catalog_entities::Model,
    ) -> RelationshipView {
        RelationshipView {
            id: relationship.id,
            source_id: source.id,
            source_name: source.name.clone(),
            source_type: source.entity_type.clone(),
            target_id: target.id,
            target_name: target.name.clone(),
            target_type: target.entity_type.clone(),
            relationship_type: relationship.relationship_type,
            created_at: relationship.created_at,
        }
    }
}
