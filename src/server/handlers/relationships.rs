use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::entities::{split_list, BulkDeleteRequest, BulkDeleteResponse};
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::relationship_service::{
    RelationshipFilter, RelationshipInput, RelationshipUpdate, RelationshipView,
};
use crate::services::ValidationService;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelationshipQuery {
    /// Keep relationships where either endpoint has this type
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    /// Case-insensitive match on either endpoint name
    pub search: Option<String>,
    /// Comma separated relationship types
    pub relationship_types: Option<String>,
}

impl RelationshipQuery {
    pub fn to_filter(&self) -> ApiResult<RelationshipFilter> {
        let entity_type = match self.entity_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case("all") => None,
            Some(value) => Some(ValidationService::parse_entity_type(value)?),
        };

        let relationship_types = split_list(self.relationship_types.as_deref())
            .iter()
            .map(|t| ValidationService::parse_relationship_type(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RelationshipFilter {
            entity_type,
            search: self.search.clone(),
            relationship_types,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/relationships",
    tag = "catalog",
    params(RelationshipQuery),
    responses(
        (status = 200, description = "Relationships, newest first", body = [RelationshipView]),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    )
)]
pub async fn list_relationships(
    State(state): State<AppState>,
    Query(query): Query<RelationshipQuery>,
) -> ApiResult<Json<Vec<RelationshipView>>> {
    let filter = query.to_filter()?;
    Ok(Json(state.relationships.list_relationships(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/relationships/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Relationship ID")),
    responses(
        (status = 200, description = "Relationship found", body = RelationshipView),
        (status = 404, description = "Relationship not found", body = ErrorBody)
    )
)]
pub async fn get_relationship(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<RelationshipView>> {
    Ok(Json(state.relationships.get_relationship(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/relationships",
    tag = "catalog",
    security(("session" = [])),
    request_body = RelationshipInput,
    responses(
        (status = 201, description = "Relationship created", body = RelationshipView),
        (status = 400, description = "Invalid type or self-reference", body = ErrorBody),
        (status = 404, description = "Endpoint entity not found", body = ErrorBody),
        (status = 409, description = "Relationship already exists", body = ErrorBody)
    )
)]
pub async fn create_relationship(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<RelationshipInput>,
) -> ApiResult<(StatusCode, Json<RelationshipView>)> {
    let relationship = state
        .relationships
        .create_relationship(&admin.actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(relationship)))
}

#[utoipa::path(
    put,
    path = "/api/v1/relationships/{id}",
    tag = "catalog",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Relationship ID")),
    request_body = RelationshipUpdate,
    responses(
        (status = 200, description = "Relationship updated", body = RelationshipView),
        (status = 404, description = "Relationship not found", body = ErrorBody),
        (status = 409, description = "Relationship already exists", body = ErrorBody)
    )
)]
pub async fn update_relationship(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<RelationshipUpdate>,
) -> ApiResult<Json<RelationshipView>> {
    Ok(Json(
        state
            .relationships
            .update_relationship(&admin.actor, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/relationships/{id}",
    tag = "catalog",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Relationship ID")),
    responses(
        (status = 204, description = "Relationship deleted"),
        (status = 404, description = "Relationship not found", body = ErrorBody)
    )
)]
pub async fn delete_relationship(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.relationships.delete_relationship(&admin.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/relationships/bulk-delete",
    tag = "catalog",
    security(("session" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Number of relationships deleted", body = BulkDeleteResponse),
        (status = 403, description = "Requires super admin", body = ErrorBody)
    )
)]
pub async fn bulk_delete_relationships(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let deleted = state
        .relationships
        .bulk_delete_relationships(&admin.actor, &payload.ids)
        .await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
