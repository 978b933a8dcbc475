// handlers/protected/auth.rs - POST /auth/login/test-token

use axum::Extension;

use crate::database::models::UserPublic;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// Echo the account behind the presented token
pub async fn test_token(Extension(current): Extension<CurrentUser>) -> ApiResult<UserPublic> {
    Ok(ApiResponse::success(UserPublic::from(&current.0)))
}
