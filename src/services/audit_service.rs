use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{AdminAction, AdminActor};
use crate::database::entities::audit_log::{self, AuditAction};
use crate::errors::{CatalogError, CatalogResult};

const DEFAULT_PAGE_SIZE: u64 = 100;
const MAX_PAGE_SIZE: u64 = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    pub admin_user: Option<String>,
    pub action_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct AuditSummary {
    pub total_actions: u64,
    /// Actions recorded in the last 24 hours
    pub recent_actions: u64,
    /// Distinct admins that have performed at least one action
    pub active_admins: u64,
    pub action_counts: BTreeMap<String, u64>,
    pub role_counts: BTreeMap<String, u64>,
}

/// What a mutation did, recorded alongside it.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub subject: &'static str,
    pub entity_id: Option<i32>,
    pub details: Value,
}

impl AuditRecord {
    pub fn new(action: AuditAction, subject: &'static str) -> Self {
        Self {
            action,
            subject,
            entity_id: None,
            details: Value::Null,
        }
    }

    pub fn entity_id(mut self, entity_id: i32) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Clone)]
pub struct AuditService {
    db: DatabaseConnection,
}

impl AuditService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append an audit row on `conn`. Callers pass their open transaction so
    /// the row commits or rolls back with the mutation it describes.
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        actor: &AdminActor,
        record: AuditRecord,
    ) -> CatalogResult<audit_log::Model> {
        let mut entry = audit_log::ActiveModel::new(
            actor.username.clone(),
            actor.audit_role().to_string(),
            record.action,
        );
        entry.entity_type = Set(Some(record.subject.to_string()));
        entry.entity_id = Set(record.entity_id);
        if !record.details.is_null() {
            entry.details = Set(Some(record.details));
        }

        entry
            .insert(conn)
            .await
            .map_err(|e| CatalogError::from_db("record audit entry", e))
    }

    pub async fn list_audit_logs(
        &self,
        actor: &AdminActor,
        filter: &AuditLogFilter,
    ) -> CatalogResult<Vec<audit_log::Model>> {
        actor.require(AdminAction::ViewAuditLog)?;

        let mut query = audit_log::Entity::find();

        if let Some(admin_user) = filter.admin_user.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_log::Column::AdminUser.eq(admin_user));
        }
        if let Some(action_type) = filter.action_type.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_log::Column::ActionType.eq(action_type));
        }
        if let Some(from) = filter.from {
            query = query.filter(audit_log::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(audit_log::Column::CreatedAt.lte(to));
        }

        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        query
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .limit(limit)
            .offset(filter.offset.unwrap_or(0))
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list audit logs", e))
    }

    pub async fn audit_summary(&self, actor: &AdminActor) -> CatalogResult<AuditSummary> {
        actor.require(AdminAction::ViewAuditLog)?;

        let total_actions = audit_log::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("count audit logs", e))?;

        let recent_actions = audit_log::Entity::find()
            .filter(audit_log::Column::CreatedAt.gte(Utc::now() - Duration::hours(24)))
            .count(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("count recent audit logs", e))?;

        let action_counts = self.grouped_counts(audit_log::Column::ActionType).await?;
        let role_counts = self.grouped_counts(audit_log::Column::AdminRole).await?;
        let active_admins = self.grouped_counts(audit_log::Column::AdminUser).await?.len() as u64;

        Ok(AuditSummary {
            total_actions,
            recent_actions,
            active_admins,
            action_counts,
            role_counts,
        })
    }

    async fn grouped_counts(&self, column: audit_log::Column) -> CatalogResult<BTreeMap<String, u64>> {
        let rows: Vec<(String, i64)> = audit_log::Entity::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(audit_log::Column::Id).count(), "count")
            .group_by(column)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("summarise audit logs", e))?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| (key, count.max(0) as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminRole;
    use crate::database::entities::audit_log::subject;
    use crate::database::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn summary_counts_actions_and_roles() {
        let (db, _dir) = setup_test_db().await;
        let service = AuditService::new(db.clone());
        let admin = AdminActor::new("alice", AdminRole::Admin);
        let root = AdminActor::new("root", AdminRole::SuperAdmin);

        AuditService::record(
            &db,
            &admin,
            AuditRecord::new(AuditAction::CreateEntity, subject::ENTITY)
                .entity_id(1)
                .details(json!({"name": "Kubernetes"})),
        )
        .await
        .unwrap();
        AuditService::record(&db, &admin, AuditRecord::new(AuditAction::CreateTag, subject::TAG))
            .await
            .unwrap();
        AuditService::record(&db, &root, AuditRecord::new(AuditAction::CreateTag, subject::TAG))
            .await
            .unwrap();

        let summary = service.audit_summary(&root).await.unwrap();
        assert_eq!(summary.total_actions, 3);
        assert_eq!(summary.recent_actions, 3);
        assert_eq!(summary.active_admins, 2);
        assert_eq!(summary.action_counts.get("create_tag"), Some(&2));
        assert_eq!(summary.role_counts.get("admin"), Some(&2));
        assert_eq!(summary.role_counts.get("super_admin"), Some(&1));
    }

    #[tokio::test]
    async fn listing_filters_and_requires_super_admin() {
        let (db, _dir) = setup_test_db().await;
        let service = AuditService::new(db.clone());
        let admin = AdminActor::new("alice", AdminRole::Admin);
        let root = AdminActor::new("root", AdminRole::SuperAdmin);

        for action in [AuditAction::CreateEntity, AuditAction::DeleteEntity] {
            AuditService::record(&db, &admin, AuditRecord::new(action, subject::ENTITY))
                .await
                .unwrap();
        }

        let err = service
            .list_audit_logs(&admin, &AuditLogFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 403);

        let all = service
            .list_audit_logs(&root, &AuditLogFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action_type, "delete_entity");

        let deletes = service
            .list_audit_logs(
                &root,
                &AuditLogFilter {
                    action_type: Some("delete_entity".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(deletes.len(), 1);
    }
}
