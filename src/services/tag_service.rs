use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::{AdminAction, AdminActor};
use crate::database::entities::audit_log::{subject, AuditAction};
use crate::database::entities::{entity_tags, tags};
use crate::errors::{CatalogError, CatalogResult};
use crate::services::audit_service::{AuditRecord, AuditService};
use crate::services::ValidationService;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct TagView {
    pub id: i32,
    pub name: String,
    /// Number of entities carrying the tag
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TagService {
    db: DatabaseConnection,
}

impl TagService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_tags(&self) -> CatalogResult<Vec<TagView>> {
        let all_tags = tags::Entity::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list tags", e))?;

        let links = entity_tags::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list tag usage", e))?;

        let mut usage: HashMap<i32, u64> = HashMap::new();
        for link in links {
            *usage.entry(link.tag_id).or_insert(0) += 1;
        }

        Ok(all_tags
            .into_iter()
            .map(|tag| TagView {
                usage_count: usage.get(&tag.id).copied().unwrap_or(0),
                id: tag.id,
                name: tag.name,
                created_at: tag.created_at,
            })
            .collect())
    }

    pub async fn create_tag(&self, actor: &AdminActor, name: &str) -> CatalogResult<tags::Model> {
        actor.require(AdminAction::ManageCatalog)?;
        let name = ValidationService::validate_tag_name(name)?;

        let txn = self.db.begin().await?;

        let existing = tags::Entity::find()
            .filter(tags::Column::Name.eq(name.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(CatalogError::conflict(format!("Tag '{}' already exists", name)));
        }

        let tag = tags::ActiveModel::new(name)
            .insert(&txn)
            .await
            .map_err(|e| CatalogError::from_db("create tag", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::CreateTag, subject::TAG)
                .entity_id(tag.id)
                .details(json!({ "name": tag.name })),
        )
        .await?;

        txn.commit().await?;
        info!("Tag '{}' created by {}", tag.name, actor.username);
        Ok(tag)
    }

    /// Delete a tag; its entity associations cascade.
    pub async fn delete_tag(&self, actor: &AdminActor, id: i32) -> CatalogResult<()> {
        actor.require(AdminAction::ManageCatalog)?;

        let txn = self.db.begin().await?;

        let tag = tags::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CatalogError::not_found("tag", id))?;

        tags::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| CatalogError::from_db("delete tag", e))?;

        AuditService::record(
            &txn,
            actor,
            AuditRecord::new(AuditAction::DeleteTag, subject::TAG)
                .entity_id(id)
                .details(json!({ "name": tag.name })),
        )
        .await?;

        txn.commit().await?;
        info!("Tag '{}' deleted by {}", tag.name, actor.username);
        Ok(())
    }

    /// Resolve tag names to rows, inserting any that do not exist yet.
    ///
    /// Missing names are inserted with `ON CONFLICT (name) DO NOTHING`, so a
    /// tag created concurrently by another request is reused rather than
    /// failing this one.
    pub async fn get_or_create_tags<C: ConnectionTrait>(
        conn: &C,
        names: &[String],
    ) -> CatalogResult<Vec<tags::Model>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let existing = Self::find_by_names(conn, names).await?;
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !existing.contains_key(name.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Self::in_order(names, existing);
        }

        Self::insert_missing(conn, &missing).await?;
        let resolved = Self::find_by_names(conn, names).await?;
        Self::in_order(names, resolved)
    }

    /// Insert tags, skipping names that already exist. Returns the number of
    /// rows inserted.
    async fn insert_missing<C: ConnectionTrait>(conn: &C, names: &[String]) -> CatalogResult<u64> {
        if names.is_empty() {
            return Ok(0);
        }
        tags::Entity::insert_many(names.iter().map(|name| tags::ActiveModel::new(name.clone())))
            .on_conflict(OnConflict::column(tags::Column::Name).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await
            .map_err(|e| CatalogError::from_db("create tag", e))
    }

    async fn find_by_names<C: ConnectionTrait>(
        conn: &C,
        names: &[String],
    ) -> CatalogResult<HashMap<String, tags::Model>> {
        let rows = tags::Entity::find()
            .filter(tags::Column::Name.is_in(names.iter().cloned()))
            .all(conn)
            .await
            .map_err(|e| CatalogError::from_db("find tags", e))?;
        Ok(rows.into_iter().map(|tag| (tag.name.clone(), tag)).collect())
    }

    fn in_order(
        names: &[String],
        by_name: HashMap<String, tags::Model>,
    ) -> CatalogResult<Vec<tags::Model>> {
        names
            .iter()
            .map(|name| {
                by_name
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CatalogError::Internal(format!("Tag '{}' was not stored", name)))
            })
            .collect()
    }

    /// Tag names per entity id, sorted by name.
    pub async fn tags_for_entities<C: ConnectionTrait>(
        conn: &C,
        entity_ids: &[i32],
    ) -> CatalogResult<HashMap<i32, Vec<String>>> {
        let mut by_entity: HashMap<i32, Vec<String>> = HashMap::new();
        if entity_ids.is_empty() {
            return Ok(by_entity);
        }

        let rows = entity_tags::Entity::find()
            .filter(entity_tags::Column::EntityId.is_in(entity_ids.iter().copied()))
            .find_also_related(tags::Entity)
            .all(conn)
            .await?;

        for (link, tag) in rows {
            if let Some(tag) = tag {
                by_entity.entry(link.entity_id).or_default().push(tag.name);
            }
        }
        for names in by_entity.values_mut() {
            names.sort();
        }
        Ok(by_entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminRole;
    use crate::database::entities::audit_log;
    use crate::database::test_utils::setup_test_db;
    use crate::services::entity_service::{EntityInput, EntityService};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn duplicate_tag_name_is_a_conflict() {
        let (db, _dir) = setup_test_db().await;
        let service = TagService::new(db.clone());
        let actor = AdminActor::new("alice", AdminRole::Admin);

        service.create_tag(&actor, "cloud").await.unwrap();
        let err = service.create_tag(&actor, " cloud ").await.unwrap_err();
        assert!(err.is_conflict());

        assert_eq!(audit_log::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_or_create_reuses_existing_tags() {
        let (db, _dir) = setup_test_db().await;

        let first = TagService::get_or_create_tags(&db, &["cloud".to_string()])
            .await
            .unwrap();
        let second = TagService::get_or_create_tags(&db, &["cloud".to_string(), "iam".to_string()])
            .await
            .unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(tags::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn deleting_missing_tag_is_not_found() {
        let (db, _dir) = setup_test_db().await;
        let service = TagService::new(db);
        let actor = AdminActor::new("alice", AdminRole::Admin);

        let err = service.delete_tag(&actor, 99).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn tag_inserted_by_another_request_is_reused() {
        let (db, _dir) = setup_test_db().await;
        let service = TagService::new(db.clone());
        let actor = AdminActor::new("alice", AdminRole::Admin);
        let winner = service.create_tag(&actor, "shared").await.unwrap();

        // Lost the race: the name is inserted again after the lookup
        let inserted = TagService::insert_missing(&db, &["shared".to_string(), "fresh".to_string()])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let resolved = TagService::get_or_create_tags(&db, &["shared".to_string(), "fresh".to_string()])
            .await
            .unwrap();
        assert_eq!(resolved[0].id, winner.id);
        assert_eq!(resolved[1].name, "fresh");
        assert_eq!(tags::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_entities_share_a_new_tag() {
        let (db, _dir) = setup_test_db().await;
        let entities = EntityService::new(db.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let entities = entities.clone();
                tokio::spawn(async move {
                    let actor = AdminActor::new("alice", AdminRole::Admin);
                    entities
                        .create_entity(
                            &actor,
                            EntityInput {
                                name: format!("Tool {}", i),
                                entity_type: "tool".to_string(),
                                description: None,
                                metadata: None,
                                tags: vec!["shared".to_string()],
                            },
                        )
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tags::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(entity_tags::Entity::find().count(&db).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn deleting_a_tag_unlinks_it_but_keeps_entities() {
        let (db, _dir) = setup_test_db().await;
        let service = TagService::new(db.clone());
        let entities = EntityService::new(db.clone());
        let actor = AdminActor::new("alice", AdminRole::Admin);

        let entity = entities
            .create_entity(
                &actor,
                EntityInput {
                    name: "Kubernetes".to_string(),
                    entity_type: "tool".to_string(),
                    description: None,
                    metadata: None,
                    tags: vec!["cloud".to_string(), "containers".to_string()],
                },
            )
            .await
            .unwrap();

        let cloud = tags::Entity::find()
            .filter(tags::Column::Name.eq("cloud"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        service.delete_tag(&actor, cloud.id).await.unwrap();

        let links = entity_tags::Entity::find()
            .filter(entity_tags::Column::TagId.eq(cloud.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(links, 0);

        let survivor = entities.get_entity(entity.id).await.unwrap();
        assert_eq!(survivor.entity.tags, vec!["containers".to_string()]);
    }
}
