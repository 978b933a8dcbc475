// handlers/protected/users.rs - /users/* account administration
//
// Permission, manageable-role and self-action guards live in UserService;
// these handlers validate bodies and pick the response view.

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::database::models::*;
use crate::handlers::{user_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::{self, Role};
use crate::services::{PermissionSummary, UserList};

/// GET /users
pub async fn list_users(
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<UserList> {
    let users = user_service().await?.list_users(&current.0, &filter, page.page()).await?;
    Ok(ApiResponse::success(users))
}

/// POST /users
pub async fn create_user(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<UserPublic> {
    let new = validated(payload)?;
    let user = user_service().await?.create_user(&current.0, new).await?;
    Ok(ApiResponse::created(UserPublic::from(&user)).with_message("User created successfully"))
}

/// GET /users/me
pub async fn read_me(Extension(current): Extension<CurrentUser>) -> ApiResult<UserPublic> {
    Ok(ApiResponse::success(UserPublic::from(&current.0)))
}

/// PUT /users/me
pub async fn update_me(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<UserPublic> {
    let patch = validated(payload)?;
    let user = user_service().await?.update_profile(&current.0, patch).await?;
    Ok(ApiResponse::success(UserPublic::from(&user)).with_message("Profile updated successfully"))
}

/// POST /users/me/change-password
pub async fn change_password(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<bool> {
    let change = validated(payload)?;
    user_service().await?.change_password(&current.0, change).await?;
    Ok(ApiResponse::success(true).with_message("Password updated successfully"))
}

/// GET /users/:id
pub async fn get_user(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<Value> {
    let user = user_service().await?.get_user(&current.0, id).await?;
    Ok(ApiResponse::success(current.view_of(&user)))
}

/// PUT /users/:id
pub async fn update_user(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Value> {
    let patch = validated(payload)?;
    let user = user_service().await?.update_user(&current.0, id, patch).await?;
    Ok(ApiResponse::success(current.view_of(&user)).with_message("User updated successfully"))
}

/// DELETE /users/:id (soft delete)
pub async fn delete_user(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    user_service().await?.delete_user(&current.0, id).await?;
    Ok(ApiResponse::success(true).with_message("User deleted successfully"))
}

/// PUT /users/:id/role
pub async fn update_user_role(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(update): Json<UserRoleUpdate>,
) -> ApiResult<UserAdmin> {
    let user = user_service().await?.update_user_role(&current.0, id, update).await?;
    Ok(ApiResponse::success(UserAdmin::from(&user)).with_message(format!("User role updated to {}", user.role)))
}

#[derive(Debug, Serialize)]
pub struct TemporaryPassword {
    pub user_id: i32,
    pub temporary_password: String,
}

/// POST /users/:id/reset-password
pub async fn reset_password(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<TemporaryPassword> {
    let (user, temporary_password) = user_service().await?.reset_password(&current.0, id).await?;
    Ok(ApiResponse::success(TemporaryPassword {
        user_id: user.id,
        temporary_password,
    })
    .with_message("Password reset successfully"))
}

/// POST /users/:id/restore
pub async fn restore_user(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<UserAdmin> {
    let user = user_service().await?.restore_user(&current.0, id).await?;
    Ok(ApiResponse::success(UserAdmin::from(&user)).with_message("User restored successfully"))
}

/// GET /users/roles/available
pub async fn available_roles(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(permissions::get_manageable_roles(current.0.role).to_vec()))
}

/// GET /users/permissions/check
pub async fn check_permissions(Extension(current): Extension<CurrentUser>) -> ApiResult<PermissionSummary> {
    Ok(ApiResponse::success(PermissionSummary::for_user(&current.0)))
}

/// GET /users/stats/summary
pub async fn stats(Extension(current): Extension<CurrentUser>) -> ApiResult<UserStats> {
    let stats = user_service().await?.stats(&current.0).await?;
    Ok(ApiResponse::success(stats))
}
