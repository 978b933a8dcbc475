// handlers/public/auth.rs - POST /auth/login/access-token, POST /auth/password-recovery/:email

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::handlers::user_service;
use crate::middleware::{ApiResponse, ApiResult};

/// OAuth2 password-flow credentials. `username` carries the email address.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for Credentials {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(credentials) = Json::<Credentials>::from_request(req, state).await?;
            Ok(credentials)
        } else {
            let Form(credentials) = Form::<Credentials>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
            Ok(credentials)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /auth/login/access-token
///
/// Returns the bare token object so OAuth2 password-flow clients can read it.
pub async fn login_access_token(credentials: Credentials) -> Result<Json<AccessToken>, ApiError> {
    let service = user_service().await?;
    let user = service.authenticate(&credentials.username, &credentials.password).await?;

    let access_token = generate_jwt(&Claims::new(user.id, user.role))?;
    Ok(Json(AccessToken {
        access_token,
        token_type: "bearer",
    }))
}

/// POST /auth/password-recovery/:email
pub async fn password_recovery(Path(email): Path<String>) -> ApiResult<bool> {
    user_service().await?.recover_password(&email).await?;
    Ok(ApiResponse::success(true).with_message("Password recovery email sent"))
}
