use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::database::entities::audit_log;
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::{AuditLogFilter, AuditSummary};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub admin_user: Option<String>,
    /// e.g. `create_entity`, `bulk_delete`
    pub action_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Defaults to 100, at most 1000
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<AuditLogQuery> for AuditLogFilter {
    fn from(query: AuditLogQuery) -> Self {
        AuditLogFilter {
            admin_user: query.admin_user,
            action_type: query.action_type,
            from: query.from,
            to: query.to,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    tag = "admin",
    security(("session" = [])),
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = [audit_log::Model]),
        (status = 403, description = "Requires super admin", body = ErrorBody)
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<audit_log::Model>>> {
    let filter = AuditLogFilter::from(query);
    Ok(Json(state.audit.list_audit_logs(&admin.actor, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/summary",
    tag = "admin",
    security(("session" = [])),
    responses(
        (status = 200, description = "Action counts by type and role", body = AuditSummary),
        (status = 403, description = "Requires super admin", body = ErrorBody)
    )
)]
pub async fn audit_summary(
    State(state): State<AppState>,
    admin: CurrentAdmin,
) -> ApiResult<Json<AuditSummary>> {
    Ok(Json(state.audit.audit_summary(&admin.actor).await?))
}
