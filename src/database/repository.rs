//! Storage seams for the user and asset services.
//!
//! Lookups return `Ok(None)` for missing rows; deciding whether that is a
//! not-found error belongs to the caller. `save_*` writes every mutable
//! column of an already-patched row and bumps `updated_at`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::*;
use crate::types::Page;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Active (not soft-deleted) user by id
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError>;

    /// User by id regardless of soft-delete state
    async fn user_by_id_any(&self, id: i32) -> Result<Option<User>, DatabaseError>;

    /// User by email. Soft-deleted rows are included only when asked, since they
    /// still hold the unique email.
    async fn user_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>, DatabaseError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn user_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, DatabaseError>;

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, DatabaseError>;

    async fn count_users(&self, filter: &UserFilter) -> Result<i64, DatabaseError>;

    async fn insert_user(&self, draft: &UserDraft) -> Result<User, DatabaseError>;

    async fn save_user(&self, user: &User) -> Result<User, DatabaseError>;

    async fn user_stats(&self) -> Result<UserStats, DatabaseError>;
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    // Locations
    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, DatabaseError>;
    async fn location_by_code(&self, code: &str) -> Result<Option<Location>, DatabaseError>;
    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>, DatabaseError>;
    async fn location_children(&self, id: i32) -> Result<Vec<Location>, DatabaseError>;
    async fn insert_location(&self, uuid: Uuid, new: &NewLocation) -> Result<Location, DatabaseError>;
    async fn save_location(&self, location: &Location) -> Result<Location, DatabaseError>;
    async fn delete_location(&self, id: i32) -> Result<bool, DatabaseError>;

    // Templates
    async fn template_by_id(&self, id: i32) -> Result<Option<AssetTemplate>, DatabaseError>;
    async fn template_by_code(&self, code: &str) -> Result<Option<AssetTemplate>, DatabaseError>;
    async fn list_templates(&self, filter: &TemplateFilter, page: Page) -> Result<Vec<AssetTemplate>, DatabaseError>;
    async fn insert_template(&self, uuid: Uuid, new: &NewTemplate) -> Result<AssetTemplate, DatabaseError>;
    async fn save_template(&self, template: &AssetTemplate) -> Result<AssetTemplate, DatabaseError>;
    async fn delete_template(&self, id: i32) -> Result<bool, DatabaseError>;

    // Store inventory
    async fn inventory_by_id(&self, id: i32) -> Result<Option<StoreInventory>, DatabaseError>;
    async fn inventory_by_template(&self, template_id: i32) -> Result<Option<StoreInventory>, DatabaseError>;
    async fn list_inventory(&self, page: Page) -> Result<Vec<StoreInventory>, DatabaseError>;
    async fn insert_inventory(&self, new: &NewInventory) -> Result<StoreInventory, DatabaseError>;
    async fn save_inventory(&self, inventory: &StoreInventory) -> Result<StoreInventory, DatabaseError>;
    async fn delete_inventory(&self, id: i32) -> Result<bool, DatabaseError>;

    // Assets
    async fn asset_by_id(&self, id: i32) -> Result<Option<Asset>, DatabaseError>;
    async fn asset_by_uuid(&self, uuid: Uuid) -> Result<Option<Asset>, DatabaseError>;
    async fn asset_by_code(&self, code: &str) -> Result<Option<Asset>, DatabaseError>;
    async fn list_assets(&self, filter: &AssetFilter, page: Page) -> Result<Vec<Asset>, DatabaseError>;
    /// Direct children ordered by id
    async fn asset_children(&self, id: i32) -> Result<Vec<Asset>, DatabaseError>;
    async fn insert_asset(&self, draft: &AssetDraft) -> Result<Asset, DatabaseError>;
    async fn save_asset(&self, asset: &Asset) -> Result<Asset, DatabaseError>;
    async fn delete_asset(&self, id: i32) -> Result<bool, DatabaseError>;

    // Deployed items
    async fn item_by_id(&self, id: i32) -> Result<Option<AssetItem>, DatabaseError>;
    async fn list_items(&self, filter: &AssetItemFilter, page: Page) -> Result<Vec<AssetItem>, DatabaseError>;
    async fn insert_item(&self, draft: &AssetItemDraft) -> Result<AssetItem, DatabaseError>;
    async fn save_item(&self, item: &AssetItem) -> Result<AssetItem, DatabaseError>;
    async fn delete_item(&self, id: i32) -> Result<bool, DatabaseError>;

    // Sensors
    async fn sensor_by_id(&self, id: i32) -> Result<Option<AssetSensor>, DatabaseError>;
    async fn sensor_by_uuid(&self, uuid: Uuid) -> Result<Option<AssetSensor>, DatabaseError>;
    async fn list_sensors(&self, filter: &SensorFilter, page: Page) -> Result<Vec<AssetSensor>, DatabaseError>;
    async fn insert_sensor(&self, uuid: Uuid, asset_id: i32, new: &NewSensor) -> Result<AssetSensor, DatabaseError>;
    async fn save_sensor(&self, sensor: &AssetSensor) -> Result<AssetSensor, DatabaseError>;
    async fn delete_sensor(&self, id: i32) -> Result<bool, DatabaseError>;
}
