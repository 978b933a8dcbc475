// handlers/protected/assets/assets.rs - /assets, /assets/:id, /assets/uuid/:uuid and tree views

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};
use uuid::Uuid;

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

/// GET /assets
pub async fn list_assets(
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<AssetFilter>,
) -> ApiResult<Vec<Asset>> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.list_assets(&filter, page.page()).await?))
}

/// POST /assets
pub async fn create_asset(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewAsset>, JsonRejection>,
) -> ApiResult<Asset> {
    current.require(Permission::AssetCreate)?;
    let new = validated(payload)?;
    let asset = asset_service().await?.create_asset(new, Some(current.0.id)).await?;
    Ok(ApiResponse::created(asset))
}

/// GET /assets/:id
pub async fn get_asset(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<Asset> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_asset(id).await?))
}

/// GET /assets/uuid/:uuid
pub async fn get_asset_by_uuid(Extension(current): Extension<CurrentUser>, Path(uuid): Path<Uuid>) -> ApiResult<Asset> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_asset_by_uuid(uuid).await?))
}

/// PUT /assets/:id
pub async fn update_asset(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<AssetPatch>, JsonRejection>,
) -> ApiResult<Asset> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_asset(id, patch).await?))
}

/// DELETE /assets/:id
pub async fn delete_asset(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_asset(id).await?))
}

/// GET /assets/:id/hierarchy
pub async fn asset_hierarchy(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<AssetHierarchy> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.hierarchy(id).await?))
}

/// GET /assets/:id/ancestors
pub async fn asset_ancestors(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<AssetAncestors> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.ancestry(id).await?))
}

/// GET /assets/:id/children
pub async fn asset_children(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<Vec<Asset>> {
    current.require(Permission::AssetRead)?;
    let service = asset_service().await?;
    service.get_asset(id).await?;
    Ok(ApiResponse::success(service.get_descendants_shallow(id).await?))
}
