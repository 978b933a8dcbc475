// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) -> Protected (JWT + active user)
pub mod protected;
pub mod public;

use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;
use validator::Validate;

use crate::database::PgStore;
use crate::error::ApiError;
use crate::services::{AssetService, UserService};
use crate::types::Page;

/// `?skip=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

/// Unwrap a JSON body and run its field validators
pub fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;
    Ok(payload)
}

pub async fn user_service() -> Result<UserService<PgStore>, ApiError> {
    Ok(UserService::new(PgStore::connect().await?))
}

pub async fn asset_service() -> Result<AssetService<PgStore>, ApiError> {
    Ok(AssetService::new(PgStore::connect().await?))
}
