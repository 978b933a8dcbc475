// handlers/protected/assets/templates.rs - /assets/templates[/:id]

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

pub async fn list_templates(
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<TemplateFilter>,
) -> ApiResult<Vec<AssetTemplate>> {
    current.require(Permission::AssetRead)?;
    let templates = asset_service().await?.list_templates(&filter, page.page()).await?;
    Ok(ApiResponse::success(templates))
}

pub async fn create_template(
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewTemplate>, JsonRejection>,
) -> ApiResult<AssetTemplate> {
    current.require(Permission::AssetCreate)?;
    let new = validated(payload)?;
    Ok(ApiResponse::created(asset_service().await?.create_template(new).await?))
}

pub async fn get_template(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<AssetTemplate> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_template(id).await?))
}

pub async fn update_template(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<TemplatePatch>, JsonRejection>,
) -> ApiResult<AssetTemplate> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_template(id, patch).await?))
}

pub async fn delete_template(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_template(id).await?))
}
