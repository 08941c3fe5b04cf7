use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminRole;
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::SessionInfo;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub username: String,
    pub role: AdminRole,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = SessionInfo),
        (status = 401, description = "Invalid username or password", body = ErrorBody),
        (status = 423, description = "Account locked", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<SessionInfo>> {
    let session = state.auth.login(&payload.username, &payload.password).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "admin",
    security(("session" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn logout(State(state): State<AppState>, admin: CurrentAdmin) -> ApiResult<StatusCode> {
    state.auth.logout(&admin.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "admin",
    security(("session" = [])),
    responses(
        (status = 200, description = "Current admin", body = MeResponse),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn me(admin: CurrentAdmin) -> Json<MeResponse> {
    Json(MeResponse {
        username: admin.actor.username,
        role: admin.actor.role,
    })
}
