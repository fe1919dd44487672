//! services/api/src/web/admin.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use duotrack_core::admin;
use duotrack_core::domain::Identity;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{AdminFlagRequest, OverviewDto, UserDto};
use crate::web::response::{respond, HttpResult};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Platform counts and the newest accounts", body = OverviewDto),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let overview = admin::overview(state.db.as_ref(), &identity).await?;
    Ok(respond(StatusCode::OK, "Stats fetched", OverviewDto::from(overview)))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Every account, newest first", body = [UserDto]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let users: Vec<UserDto> = admin::list_users(state.db.as_ref(), &identity)
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(respond(StatusCode::OK, "Users fetched", users))
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    request_body = AdminFlagRequest,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Admin flag updated", body = UserDto),
        (status = 400, description = "Admins cannot revoke their own access"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_admin_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AdminFlagRequest>,
) -> HttpResult {
    let user = admin::set_admin(state.db.as_ref(), &identity, user_id, req.is_admin).await?;
    Ok(respond(StatusCode::OK, "User updated", UserDto::from(user)))
}
