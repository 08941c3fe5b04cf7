use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminRole;
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extractors::CurrentAdmin;
use crate::services::AdminView;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    /// `admin` or `super_admin`; defaults to `admin`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/admins",
    tag = "admin",
    security(("session" = [])),
    responses(
        (status = 200, description = "Admin accounts", body = [AdminView]),
        (status = 403, description = "Requires super admin", body = ErrorBody)
    )
)]
pub async fn list_admins(
    State(state): State<AppState>,
    admin: CurrentAdmin,
) -> ApiResult<Json<Vec<AdminView>>> {
    Ok(Json(state.admins.list_admins(&admin.actor).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admins",
    tag = "admin",
    security(("session" = [])),
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = AdminView),
        (status = 400, description = "Invalid username, password or role", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody)
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(payload): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<AdminView>)> {
    let role = match payload.role.as_deref() {
        Some(role) => AdminRole::parse(role)?,
        None => AdminRole::Admin,
    };
    let created = state
        .admins
        .create_admin(&admin.actor, &payload.username, &payload.password, role)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admins/{username}/password",
    tag = "admin",
    security(("session" = [])),
    params(("username" = String, Path, description = "Admin username")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password changed and lockout cleared"),
        (status = 400, description = "Password too weak", body = ErrorBody),
        (status = 403, description = "Only super admins may reset other accounts", body = ErrorBody),
        (status = 404, description = "Admin not found", body = ErrorBody)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(username): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .admins
        .reset_password(&admin.actor, &username, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admins/{username}/unlock",
    tag = "admin",
    security(("session" = [])),
    params(("username" = String, Path, description = "Admin username")),
    responses(
        (status = 200, description = "Account unlocked", body = AdminView),
        (status = 404, description = "Admin not found", body = ErrorBody)
    )
)]
pub async fn unlock_admin(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(username): Path<String>,
) -> ApiResult<Json<AdminView>> {
    Ok(Json(state.admins.unlock_admin(&admin.actor, &username).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admins/{username}",
    tag = "admin",
    security(("session" = [])),
    params(("username" = String, Path, description = "Admin username")),
    responses(
        (status = 204, description = "Admin deleted"),
        (status = 403, description = "Own account or last super admin", body = ErrorBody),
        (status = 404, description = "Admin not found", body = ErrorBody)
    )
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    state.admins.delete_admin(&admin.actor, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
