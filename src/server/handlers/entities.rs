use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::entity_service::{
    EntityDetail, EntityFilter, EntityInput, EntityUpdate, EntityView, SearchField,
};
use crate::services::ValidationService;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntityQuery {
    /// capability, use case, tool or product; `all` or empty means no filter
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub search: Option<String>,
    pub search_in: Option<SearchField>,
    /// Comma separated tag names; matches entities carrying any of them
    pub tags: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl EntityQuery {
    pub fn to_filter(&self) -> ApiResult<EntityFilter> {
        let entity_type = match self.entity_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case("all") => None,
            Some(value) => Some(ValidationService::parse_entity_type(value)?),
        };

        Ok(EntityFilter {
            entity_type,
            search: self.search.clone(),
            search_in: self.search_in.unwrap_or_default(),
            tags: split_list(self.tags.as_deref()),
            created_after: self.created_after,
            created_before: self.created_before,
        })
    }
}

/// Split a comma separated query value, dropping blanks.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/entities",
    tag = "catalog",
    params(EntityQuery),
    responses(
        (status = 200, description = "Entities ordered by name", body = [EntityView]),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    )
)]
pub async fn list_entities(
    State(state): State<AppState>,
    Query(query): Query<EntityQuery>,
) -> ApiResult<Json<Vec<EntityView>>> {
    let filter = query.to_filter()?;
    Ok(Json(state.entities.list_entities(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/entities/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Entity ID")),
    responses(
        (status = 200, description = "Entity with its relationships", body = EntityDetail),
        (status = 404, description = "Entity not found", body = ErrorBody)
    )
)]
pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<EntityDetail>> {
    Ok(Json(state.entities.get_entity(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/entities",
    tag = "catalog",
    security(("session" = [])),
    request_body = EntityInput,
    responses(
        (status = 201, description = "Entity created", body = EntityView),
        (status = 400, description = "Missing name or invalid type", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn create_entity(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<EntityInput>,
) -> ApiResult<(StatusCode, Json<EntityView>)> {
    let entity = state.entities.create_entity(&admin.actor, payload).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

#[utoipa::path(
    put,
    path = "/api/v1/entities/{id}",
    tag = "catalog",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Entity ID")),
    request_body = EntityUpdate,
    responses(
        (status = 200, description = "Entity updated", body = EntityView),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 404, description = "Entity not found", body = ErrorBody)
    )
)]
pub async fn update_entity(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<EntityUpdate>,
) -> ApiResult<Json<EntityView>> {
    Ok(Json(state.entities.update_entity(&admin.actor, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/entities/{id}",
    tag = "catalog",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Entity ID")),
    responses(
        (status = 204, description = "Entity deleted with its relationships and tag links"),
        (status = 404, description = "Entity not found", body = ErrorBody)
    )
)]
pub async fn delete_entity(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.entities.delete_entity(&admin.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/entities/bulk-delete",
    tag = "catalog",
    security(("session" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Number of entities deleted", body = BulkDeleteResponse),
        (status = 403, description = "Requires super admin", body = ErrorBody),
        (status = 404, description = "None of the ids exist", body = ErrorBody)
    )
)]
pub async fn bulk_delete_entities(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let deleted = state
        .entities
        .bulk_delete_entities(&admin.actor, &payload.ids)
        .await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
