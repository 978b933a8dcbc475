// handlers/protected/assets/items.rs - /assets/:id/items, /assets/items/:id

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

/// GET /assets/:id/items
pub async fn list_asset_items(
    Extension(current): Extension<CurrentUser>,
    Path(asset_id): Path<i32>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<AssetItem>> {
    current.require(Permission::AssetRead)?;
    let filter = AssetItemFilter {
        asset_id: Some(asset_id),
        template_id: None,
    };
    Ok(ApiResponse::success(asset_service().await?.list_items(&filter, page.page()).await?))
}

/// POST /assets/:id/items
pub async fn create_asset_item(
    Extension(current): Extension<CurrentUser>,
    Path(asset_id): Path<i32>,
    payload: Result<Json<NewAssetItem>, JsonRejection>,
) -> ApiResult<AssetItem> {
    current.require(Permission::AssetAssign)?;
    let new = validated(payload)?;
    Ok(ApiResponse::created(asset_service().await?.create_asset_item(asset_id, new).await?))
}

/// GET /assets/items/:id
pub async fn get_item(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<AssetItem> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_item(id).await?))
}

/// PUT /assets/items/:id
pub async fn update_item(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<AssetItemPatch>, JsonRejection>,
) -> ApiResult<AssetItem> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_item(id, patch).await?))
}

/// DELETE /assets/items/:id
pub async fn delete_item(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_item(id).await?))
}
