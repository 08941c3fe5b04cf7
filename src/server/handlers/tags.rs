use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::tag_service::TagView;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "catalog",
    responses(
        (status = 200, description = "Tags with usage counts, ordered by name", body = [TagView])
    )
)]
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagView>>> {
    Ok(Json(state.tags.list_tags().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/tags",
    tag = "catalog",
    security(("session" = [])),
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagView),
        (status = 409, description = "Tag already exists", body = ErrorBody)
    )
)]
pub async fn create_tag(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<TagView>)> {
    let tag = state.tags.create_tag(&admin.actor, &payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(TagView {
            id: tag.id,
            name: tag.name,
            usage_count: 0,
            created_at: tag.created_at,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    tag = "catalog",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted and removed from all entities"),
        (status = 404, description = "Tag not found", body = ErrorBody)
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.tags.delete_tag(&admin.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
