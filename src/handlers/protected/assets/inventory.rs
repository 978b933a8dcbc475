// handlers/protected/assets/inventory.rs - /assets/inventory[/:id]

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

pub async fn list_inventory(
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<StoreInventory>> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.list_inventory(page.page()).await?))
}

pub async fn create_inventory(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewInventory>, JsonRejection>,
) -> ApiResult<StoreInventory> {
    current.require(Permission::AssetCreate)?;
    let new = validated(payload)?;
    Ok(ApiResponse::created(asset_service().await?.create_inventory(new).await?))
}

pub async fn get_inventory(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<StoreInventory> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_inventory(id).await?))
}

pub async fn update_inventory(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<InventoryPatch>, JsonRejection>,
) -> ApiResult<StoreInventory> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_inventory(id, patch).await?))
}

pub async fn delete_inventory(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_inventory(id).await?))
}
