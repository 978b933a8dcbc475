// handlers/protected/assets/locations.rs - /assets/locations[/:id]

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

pub async fn list_locations(
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<LocationFilter>,
) -> ApiResult<Vec<Location>> {
    current.require(Permission::AssetRead)?;
    let locations = asset_service().await?.list_locations(&filter, page.page()).await?;
    Ok(ApiResponse::success(locations))
}

pub async fn create_location(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewLocation>, JsonRejection>,
) -> ApiResult<Location> {
    current.require(Permission::AssetCreate)?;
    let new = validated(payload)?;
    let location = asset_service().await?.create_location(new).await?;
    Ok(ApiResponse::created(location))
}

pub async fn get_location(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<Location> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_location(id).await?))
}

pub async fn update_location(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<LocationPatch>, JsonRejection>,
) -> ApiResult<Location> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_location(id, patch).await?))
}

pub async fn delete_location(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_location(id).await?))
}
