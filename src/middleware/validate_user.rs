use axum::{extract::Request, middleware::Next, response::Response};

use crate::database::models::{User, UserAdmin, UserPublic};
use crate::database::PgStore;
use crate::error::ApiError;
use crate::permissions::{self, Permission};
use crate::services::UserService;
use super::auth::AuthUser;

/// The account behind the bearer token, loaded fresh for every request
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Forbidden unless the user's role grants `permission`
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if permissions::has_permission(self.0.role, permission) {
            return Ok(());
        }
        tracing::warn!("User {} ({}) lacks {}", self.0.id, self.0.role, permission);
        Err(ApiError::forbidden(format!("Not enough permissions: {} required", permission)))
    }

    pub fn can(&self, permission: Permission) -> bool {
        permissions::has_permission(self.0.role, permission)
    }

    /// Profile view, widened to the admin view for callers holding `user:admin`
    pub fn view_of(&self, user: &User) -> serde_json::Value {
        let view = if self.can(Permission::UserAdmin) {
            serde_json::to_value(UserAdmin::from(user))
        } else {
            serde_json::to_value(UserPublic::from(user))
        };
        view.unwrap_or_default()
    }
}

/// Checks the token subject against the users table. Soft-deleted accounts are
/// rejected as unauthenticated, deactivated ones as a bad request.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let service = UserService::new(PgStore::connect().await?);
    let user = service.find_active(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("Token subject {} not found or deleted", auth_user.user_id);
        ApiError::unauthorized("User not found")
    })?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    tracing::debug!("User validation successful: {} ({})", user.id, user.role);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
