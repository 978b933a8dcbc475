use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::types::nullable;

/// Longest license term a template may carry (100 years)
pub const MAX_LICENSE_DAYS: i32 = 36_500;

/// Config columns hold free-form key/value maps; reject any other JSON shape.
fn json_object(value: &Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("json_object").with_message("config must be a JSON object".into()))
    }
}

/// Position of an asset in the plant hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Plant,
    SubPlant,
    Inverter,
    String,
    Panel,
    Sensor,
}

/// Lifecycle status. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
    Decommissioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "template_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    #[default]
    Hardware,
    Consumable,
    License,
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewLocation {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub code: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationPatch {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<i32>>,
}

impl LocationPatch {
    pub fn apply_to(self, location: &mut Location) {
        if let Some(name) = self.name {
            location.name = name;
        }
        if let Some(code) = self.code {
            location.code = code;
        }
        if let Some(description) = self.description {
            location.description = description;
        }
        if let Some(parent_id) = self.parent_id {
            location.parent_id = parent_id;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationFilter {
    pub parent_id: Option<i32>,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssetTemplate {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub asset_type: AssetType,
    pub category: TemplateCategory,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    pub description: Option<String>,
    pub default_config: Option<Value>,
    pub unit_price: Option<f64>,
    pub license_duration_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTemplate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub code: Option<String>,
    pub asset_type: AssetType,
    #[serde(default)]
    pub category: TemplateCategory,
    #[validate(length(max = 100))]
    pub manufacturer: Option<String>,
    #[validate(length(max = 100))]
    pub model_number: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "json_object"))]
    pub default_config: Option<Value>,
    #[validate(range(min = 0.0))]
    pub unit_price: Option<f64>,
    #[validate(range(min = 1, max = MAX_LICENSE_DAYS))]
    pub license_duration_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TemplatePatch {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub code: Option<Option<String>>,
    pub asset_type: Option<AssetType>,
    pub category: Option<TemplateCategory>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub manufacturer: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub model_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(custom(function = "json_object"))]
    pub default_config: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0.0))]
    pub unit_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 1, max = MAX_LICENSE_DAYS))]
    pub license_duration_days: Option<Option<i32>>,
}

impl TemplatePatch {
    pub fn apply_to(self, template: &mut AssetTemplate) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(code) = self.code {
            template.code = code;
        }
        if let Some(asset_type) = self.asset_type {
            template.asset_type = asset_type;
        }
        if let Some(category) = self.category {
            template.category = category;
        }
        if let Some(manufacturer) = self.manufacturer {
            template.manufacturer = manufacturer;
        }
        if let Some(model_number) = self.model_number {
            template.model_number = model_number;
        }
        if let Some(description) = self.description {
            template.description = description;
        }
        if let Some(default_config) = self.default_config {
            template.default_config = default_config;
        }
        if let Some(unit_price) = self.unit_price {
            template.unit_price = unit_price;
        }
        if let Some(days) = self.license_duration_days {
            template.license_duration_days = days;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub asset_type: Option<AssetType>,
    pub category: Option<TemplateCategory>,
}

// ---------------------------------------------------------------------------
// Store inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StoreInventory {
    pub id: i32,
    pub template_id: i32,
    pub quantity: i32,
    pub storage_location: Option<String>,
    pub last_restocked: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewInventory {
    pub template_id: i32,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(max = 200))]
    pub storage_location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct InventoryPatch {
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 200))]
    pub storage_location: Option<Option<String>>,
}

impl InventoryPatch {
    pub fn apply_to(self, inventory: &mut StoreInventory) {
        if let Some(quantity) = self.quantity {
            inventory.quantity = quantity;
        }
        if let Some(storage_location) = self.storage_location {
            inventory.storage_location = storage_location;
        }
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: i32,
    pub uuid: Uuid,
    pub template_id: Option<i32>,
    pub name: String,
    pub code: Option<String>,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    pub parent_id: Option<i32>,
    pub location_id: Option<i32>,
    pub installation_date: Option<DateTime<Utc>>,
    pub config: Value,
    pub realtime_data_tag: Option<String>,
    pub created_by_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload. `asset_type` and `config` may be omitted when a template supplies them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewAsset {
    pub template_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub code: Option<String>,
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub status: AssetStatus,
    pub parent_id: Option<i32>,
    pub location_id: Option<i32>,
    pub installation_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "json_object"))]
    pub config: Option<Value>,
    #[validate(length(max = 200))]
    pub realtime_data_tag: Option<String>,
}

/// Fully resolved asset row, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraft {
    pub uuid: Uuid,
    pub template_id: Option<i32>,
    pub name: String,
    pub code: Option<String>,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    pub parent_id: Option<i32>,
    pub location_id: Option<i32>,
    pub installation_date: Option<DateTime<Utc>>,
    pub config: Value,
    pub realtime_data_tag: Option<String>,
    pub created_by_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssetPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub template_id: Option<Option<i32>>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub code: Option<Option<String>>,
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub installation_date: Option<Option<DateTime<Utc>>>,
    #[validate(custom(function = "json_object"))]
    pub config: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 200))]
    pub realtime_data_tag: Option<Option<String>>,
}

impl AssetPatch {
    /// Apply only the supplied fields. Explicit nulls clear nullable columns;
    /// a null for a required column is treated as absent.
    pub fn apply_to(self, asset: &mut Asset) {
        if let Some(template_id) = self.template_id {
            asset.template_id = template_id;
        }
        if let Some(name) = self.name {
            asset.name = name;
        }
        if let Some(code) = self.code {
            asset.code = code;
        }
        if let Some(asset_type) = self.asset_type {
            asset.asset_type = asset_type;
        }
        if let Some(status) = self.status {
            asset.status = status;
        }
        if let Some(parent_id) = self.parent_id {
            asset.parent_id = parent_id;
        }
        if let Some(location_id) = self.location_id {
            asset.location_id = location_id;
        }
        if let Some(installation_date) = self.installation_date {
            asset.installation_date = installation_date;
        }
        if let Some(config) = self.config {
            asset.config = config;
        }
        if let Some(tag) = self.realtime_data_tag {
            asset.realtime_data_tag = tag;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFilter {
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
    pub parent_id: Option<i32>,
    pub location_id: Option<i32>,
}

/// Asset plus every descendant, pre-order
#[derive(Debug, Clone, Serialize)]
pub struct AssetHierarchy {
    pub asset: Asset,
    pub descendants: Vec<Asset>,
}

/// Asset plus its parent chain, nearest first
#[derive(Debug, Clone, Serialize)]
pub struct AssetAncestors {
    pub asset: Asset,
    pub ancestors: Vec<Asset>,
}

// ---------------------------------------------------------------------------
// Deployed items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssetItem {
    pub id: i32,
    pub asset_id: i32,
    pub template_id: i32,
    pub quantity: i32,
    pub deployed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAssetItem {
    pub template_id: i32,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetItemDraft {
    pub asset_id: i32,
    pub template_id: i32,
    pub quantity: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssetItemPatch {
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl AssetItemPatch {
    pub fn apply_to(self, item: &mut AssetItem) {
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(expires_at) = self.expires_at {
            item.expires_at = expires_at;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetItemFilter {
    pub asset_id: Option<i32>,
    pub template_id: Option<i32>,
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssetSensor {
    pub id: i32,
    pub uuid: Uuid,
    pub asset_id: i32,
    pub name: String,
    pub sensor_path: String,
    pub system_source: String,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSensor {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub sensor_path: String,
    #[validate(length(min = 1, max = 100))]
    pub system_source: String,
    #[validate(custom(function = "json_object"))]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SensorPatch {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub sensor_path: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub system_source: Option<String>,
    #[validate(custom(function = "json_object"))]
    pub config: Option<Value>,
}

impl SensorPatch {
    pub fn apply_to(self, sensor: &mut AssetSensor) {
        if let Some(name) = self.name {
            sensor.name = name;
        }
        if let Some(sensor_path) = self.sensor_path {
            sensor.sensor_path = sensor_path;
        }
        if let Some(system_source) = self.system_source {
            sensor.system_source = system_source;
        }
        if let Some(config) = self.config {
            sensor.config = config;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorFilter {
    pub asset_id: Option<i32>,
    pub system_source: Option<String>,
}
