// handlers/protected/assets/sensors.rs - /assets/:id/sensors, /assets/sensors/:id, /assets/sensors/uuid/:uuid

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::*;
use crate::handlers::{asset_service, validated, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::permissions::Permission;

#[derive(Debug, Default, Deserialize)]
pub struct SensorQuery {
    pub system_source: Option<String>,
}

/// GET /assets/:id/sensors
pub async fn list_asset_sensors(
    Extension(current): Extension<CurrentUser>,
    Path(asset_id): Path<i32>,
    Query(page): Query<PageQuery>,
    Query(query): Query<SensorQuery>,
) -> ApiResult<Vec<AssetSensor>> {
    current.require(Permission::AssetRead)?;
    let filter = SensorFilter {
        asset_id: Some(asset_id),
        system_source: query.system_source,
    };
    Ok(ApiResponse::success(asset_service().await?.list_sensors(&filter, page.page()).await?))
}

/// POST /assets/:id/sensors
pub async fn create_sensor(
    Extension(current): Extension<CurrentUser>,
    Path(asset_id): Path<i32>,
    payload: Result<Json<NewSensor>, JsonRejection>,
) -> ApiResult<AssetSensor> {
    current.require(Permission::AssetAssign)?;
    let new = validated(payload)?;
    Ok(ApiResponse::created(asset_service().await?.create_sensor(asset_id, new).await?))
}

/// GET /assets/sensors/:id
pub async fn get_sensor(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<AssetSensor> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_sensor(id).await?))
}

/// GET /assets/sensors/uuid/:uuid
pub async fn get_sensor_by_uuid(
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<AssetSensor> {
    current.require(Permission::AssetRead)?;
    Ok(ApiResponse::success(asset_service().await?.get_sensor_by_uuid(uuid).await?))
}

/// PUT /assets/sensors/:id
pub async fn update_sensor(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Result<Json<SensorPatch>, JsonRejection>,
) -> ApiResult<AssetSensor> {
    current.require(Permission::AssetUpdate)?;
    let patch = validated(payload)?;
    Ok(ApiResponse::success(asset_service().await?.update_sensor(id, patch).await?))
}

/// DELETE /assets/sensors/:id
pub async fn delete_sensor(Extension(current): Extension<CurrentUser>, Path(id): Path<i32>) -> ApiResult<bool> {
    current.require(Permission::AssetDelete)?;
    Ok(ApiResponse::success(asset_service().await?.delete_sensor(id).await?))
}
