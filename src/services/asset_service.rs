//! Asset catalog: locations, templates, store inventory, the asset tree,
//! deployed items and sensors.
//!
//! The service performs no authorization of its own; handlers check the
//! caller's permissions before calling in.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::models::*;
use crate::database::repository::AssetRepository;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::hierarchy::{self, AssetTree, LocationTree};
use crate::types::Page;

/// Build the insert-ready row for a new asset. A template fills in a missing
/// `asset_type` and an empty `config`; the config is copied by value, so later
/// template edits do not reach existing assets.
pub fn build_asset_draft(
    input: NewAsset,
    template: Option<&AssetTemplate>,
    created_by: Option<i32>,
) -> ServiceResult<AssetDraft> {
    let asset_type = input
        .asset_type
        .or(template.map(|t| t.asset_type))
        .ok_or_else(|| ServiceError::validation("asset_type", "asset_type is required when no template is given"))?;

    let config = match input.config {
        Some(config) if !is_empty_config(&config) => config,
        _ => template
            .and_then(|t| t.default_config.clone())
            .unwrap_or_else(|| json!({})),
    };

    Ok(AssetDraft {
        uuid: Uuid::new_v4(),
        template_id: input.template_id,
        name: input.name,
        code: input.code,
        asset_type,
        status: input.status,
        parent_id: input.parent_id,
        location_id: input.location_id,
        installation_date: input.installation_date,
        config,
        realtime_data_tag: input.realtime_data_tag,
        created_by_id: created_by,
    })
}

fn is_empty_config(config: &Value) -> bool {
    match config {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Expiry for an item deployed from `template` at `now`: only license
/// templates with a duration expire automatically.
pub fn license_expiry(template: &AssetTemplate, now: DateTime<Utc>) -> ServiceResult<Option<DateTime<Utc>>> {
    match (template.category, template.license_duration_days) {
        (TemplateCategory::License, Some(days)) => now
            .checked_add_signed(Duration::days(i64::from(days)))
            .map(Some)
            .ok_or_else(|| ServiceError::validation("license_duration_days", "License duration is out of range")),
        _ => Ok(None),
    }
}

pub struct AssetService<R> {
    repo: R,
}

impl<R: AssetRepository> AssetService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ---- Locations ----

    pub async fn list_locations(&self, filter: &LocationFilter, page: Page) -> ServiceResult<Vec<Location>> {
        Ok(self.repo.list_locations(filter, page).await?)
    }

    pub async fn get_location(&self, id: i32) -> ServiceResult<Location> {
        self.repo
            .location_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location", id))
    }

    pub async fn create_location(&self, new: NewLocation) -> ServiceResult<Location> {
        if let Some(code) = &new.code {
            if self.repo.location_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("A location with this code already exists"));
            }
        }
        if let Some(parent_id) = new.parent_id {
            if self.repo.location_by_id(parent_id).await?.is_none() {
                return Err(ServiceError::not_found("Parent location", parent_id));
            }
        }

        let location = self.repo.insert_location(Uuid::new_v4(), &new).await?;
        info!("Created location {} ({})", location.id, location.name);
        Ok(location)
    }

    pub async fn update_location(&self, id: i32, patch: LocationPatch) -> ServiceResult<Location> {
        let mut location = self.get_location(id).await?;

        if let Some(Some(code)) = &patch.code {
            if location.code.as_ref() != Some(code) && self.repo.location_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("A location with this code already exists"));
            }
        }
        // Check and write are separate statements; two concurrent reparents
        // can each pass the guard. The read-side walks stay bounded either way.
        if let Some(Some(parent_id)) = patch.parent_id {
            hierarchy::ensure_no_cycle::<Location, _>(&LocationTree(&self.repo), id, parent_id).await?;
        }

        patch.apply_to(&mut location);
        Ok(self.repo.save_location(&location).await?)
    }

    /// `Ok(false)` when the location does not exist
    pub async fn delete_location(&self, id: i32) -> ServiceResult<bool> {
        if self.repo.location_by_id(id).await?.is_none() {
            return Ok(false);
        }
        if !self.repo.location_children(id).await?.is_empty() {
            warn!("Refused to delete location {} with children", id);
            return Err(ServiceError::conflict(
                "Cannot delete location with children. Please delete or reassign children first.",
            ));
        }

        let deleted = self.repo.delete_location(id).await?;
        info!("Deleted location {}", id);
        Ok(deleted)
    }

    // ---- Templates ----

    pub async fn list_templates(&self, filter: &TemplateFilter, page: Page) -> ServiceResult<Vec<AssetTemplate>> {
        Ok(self.repo.list_templates(filter, page).await?)
    }

    pub async fn get_template(&self, id: i32) -> ServiceResult<AssetTemplate> {
        self.repo
            .template_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset template", id))
    }

    pub async fn create_template(&self, new: NewTemplate) -> ServiceResult<AssetTemplate> {
        if let Some(code) = &new.code {
            if self.repo.template_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("An asset template with this code already exists"));
            }
        }

        let template = self.repo.insert_template(Uuid::new_v4(), &new).await?;
        info!("Created asset template {} ({:?})", template.id, template.code);
        Ok(template)
    }

    pub async fn update_template(&self, id: i32, patch: TemplatePatch) -> ServiceResult<AssetTemplate> {
        let mut template = self.get_template(id).await?;

        if let Some(Some(code)) = &patch.code {
            if template.code.as_ref() != Some(code) && self.repo.template_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("An asset template with this code already exists"));
            }
        }

        patch.apply_to(&mut template);
        Ok(self.repo.save_template(&template).await?)
    }

    /// Templates still referenced by assets, items or inventory surface as a conflict
    pub async fn delete_template(&self, id: i32) -> ServiceResult<bool> {
        if self.repo.template_by_id(id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.repo.delete_template(id).await?;
        info!("Deleted asset template {}", id);
        Ok(deleted)
    }

    // ---- Store inventory ----

    pub async fn list_inventory(&self, page: Page) -> ServiceResult<Vec<StoreInventory>> {
        Ok(self.repo.list_inventory(page).await?)
    }

    pub async fn get_inventory(&self, id: i32) -> ServiceResult<StoreInventory> {
        self.repo
            .inventory_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store inventory", id))
    }

    pub async fn create_inventory(&self, new: NewInventory) -> ServiceResult<StoreInventory> {
        self.get_template(new.template_id).await?;
        if self.repo.inventory_by_template(new.template_id).await?.is_some() {
            return Err(ServiceError::conflict(
                "Inventory already exists for this template. Use update instead.",
            ));
        }

        Ok(self.repo.insert_inventory(&new).await?)
    }

    /// A quantity increase counts as a restock
    pub async fn update_inventory(&self, id: i32, patch: InventoryPatch) -> ServiceResult<StoreInventory> {
        let mut inventory = self.get_inventory(id).await?;
        let previous = inventory.quantity;

        patch.apply_to(&mut inventory);
        if inventory.quantity > previous {
            inventory.last_restocked = Utc::now();
        }
        Ok(self.repo.save_inventory(&inventory).await?)
    }

    pub async fn delete_inventory(&self, id: i32) -> ServiceResult<bool> {
        Ok(self.repo.delete_inventory(id).await?)
    }

    // ---- Assets ----

    pub async fn list_assets(&self, filter: &AssetFilter, page: Page) -> ServiceResult<Vec<Asset>> {
        Ok(self.repo.list_assets(filter, page).await?)
    }

    pub async fn get_asset(&self, id: i32) -> ServiceResult<Asset> {
        self.repo
            .asset_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset", id))
    }

    pub async fn get_asset_by_uuid(&self, uuid: Uuid) -> ServiceResult<Asset> {
        self.repo
            .asset_by_uuid(uuid)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset", uuid))
    }

    /// Parent chain nearest first; empty for a root or an unknown id
    pub async fn get_ancestors(&self, id: i32) -> ServiceResult<Vec<Asset>> {
        match self.repo.asset_by_id(id).await? {
            Some(asset) => Ok(hierarchy::ancestors(&AssetTree(&self.repo), &asset).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Direct children ordered by id
    pub async fn get_descendants_shallow(&self, id: i32) -> ServiceResult<Vec<Asset>> {
        Ok(self.repo.asset_children(id).await?)
    }

    /// The asset itself followed by its whole subtree, pre-order; empty for an unknown id
    pub async fn get_descendants_deep(&self, id: i32) -> ServiceResult<Vec<Asset>> {
        match self.repo.asset_by_id(id).await? {
            Some(asset) => Ok(hierarchy::descendants(&AssetTree(&self.repo), asset).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn hierarchy(&self, id: i32) -> ServiceResult<AssetHierarchy> {
        let mut nodes = self.get_descendants_deep(id).await?.into_iter();
        let asset = nodes.next().ok_or_else(|| ServiceError::not_found("Asset", id))?;
        Ok(AssetHierarchy { asset, descendants: nodes.collect() })
    }

    pub async fn ancestry(&self, id: i32) -> ServiceResult<AssetAncestors> {
        let asset = self.get_asset(id).await?;
        let ancestors = hierarchy::ancestors(&AssetTree(&self.repo), &asset).await?;
        Ok(AssetAncestors { asset, ancestors })
    }

    pub async fn create_asset(&self, input: NewAsset, created_by: Option<i32>) -> ServiceResult<Asset> {
        if let Some(code) = &input.code {
            if self.repo.asset_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("An asset with this code already exists"));
            }
        }
        if let Some(parent_id) = input.parent_id {
            if self.repo.asset_by_id(parent_id).await?.is_none() {
                return Err(ServiceError::not_found("Parent asset", parent_id));
            }
        }
        if let Some(location_id) = input.location_id {
            if self.repo.location_by_id(location_id).await?.is_none() {
                return Err(ServiceError::not_found("Location", location_id));
            }
        }
        let template = match input.template_id {
            Some(template_id) => Some(self.get_template(template_id).await?),
            None => None,
        };

        let draft = build_asset_draft(input, template.as_ref(), created_by)?;
        let asset = self.repo.insert_asset(&draft).await?;
        info!("Created asset {} ({:?}, {:?})", asset.id, asset.code, asset.asset_type);
        Ok(asset)
    }

    pub async fn update_asset(&self, id: i32, patch: AssetPatch) -> ServiceResult<Asset> {
        let mut asset = self.get_asset(id).await?;

        if let Some(Some(code)) = &patch.code {
            if asset.code.as_ref() != Some(code) && self.repo.asset_by_code(code).await?.is_some() {
                return Err(ServiceError::conflict("An asset with this code already exists"));
            }
        }
        // Check and write are separate statements; two concurrent reparents
        // can each pass the guard. The read-side walks stay bounded either way.
        if let Some(Some(parent_id)) = patch.parent_id {
            hierarchy::ensure_no_cycle::<Asset, _>(&AssetTree(&self.repo), id, parent_id).await?;
        }
        if let Some(Some(location_id)) = patch.location_id {
            if self.repo.location_by_id(location_id).await?.is_none() {
                return Err(ServiceError::not_found("Location", location_id));
            }
        }
        if let Some(Some(template_id)) = patch.template_id {
            self.get_template(template_id).await?;
        }

        patch.apply_to(&mut asset);
        let saved = self.repo.save_asset(&asset).await?;
        debug!("Updated asset {}", saved.id);
        Ok(saved)
    }

    /// `Ok(false)` when the asset does not exist; Conflict while it has children
    pub async fn delete_asset(&self, id: i32) -> ServiceResult<bool> {
        if self.repo.asset_by_id(id).await?.is_none() {
            return Ok(false);
        }
        if !self.get_descendants_shallow(id).await?.is_empty() {
            warn!("Refused to delete asset {} with children", id);
            return Err(ServiceError::conflict(
                "Cannot delete asset with children. Please delete or reassign children first.",
            ));
        }

        let deleted = self.repo.delete_asset(id).await?;
        info!("Deleted asset {}", id);
        Ok(deleted)
    }

    // ---- Deployed items ----

    pub async fn list_items(&self, filter: &AssetItemFilter, page: Page) -> ServiceResult<Vec<AssetItem>> {
        Ok(self.repo.list_items(filter, page).await?)
    }

    pub async fn get_item(&self, id: i32) -> ServiceResult<AssetItem> {
        self.repo
            .item_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset item", id))
    }

    pub async fn create_asset_item(&self, asset_id: i32, input: NewAssetItem) -> ServiceResult<AssetItem> {
        self.get_asset(asset_id).await?;
        let template = self.get_template(input.template_id).await?;

        let draft = AssetItemDraft {
            asset_id,
            template_id: template.id,
            quantity: input.quantity,
            expires_at: license_expiry(&template, Utc::now())?.or(input.expires_at),
        };
        let item = self.repo.insert_item(&draft).await?;
        info!("Deployed {} x template {} on asset {}", item.quantity, item.template_id, asset_id);
        Ok(item)
    }

    pub async fn update_item(&self, id: i32, patch: AssetItemPatch) -> ServiceResult<AssetItem> {
        let mut item = self.get_item(id).await?;
        patch.apply_to(&mut item);
        Ok(self.repo.save_item(&item).await?)
    }

    pub async fn delete_item(&self, id: i32) -> ServiceResult<bool> {
        Ok(self.repo.delete_item(id).await?)
    }

    // ---- Sensors ----

    pub async fn list_sensors(&self, filter: &SensorFilter, page: Page) -> ServiceResult<Vec<AssetSensor>> {
        Ok(self.repo.list_sensors(filter, page).await?)
    }

    pub async fn get_sensor(&self, id: i32) -> ServiceResult<AssetSensor> {
        self.repo
            .sensor_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset sensor", id))
    }

    pub async fn get_sensor_by_uuid(&self, uuid: Uuid) -> ServiceResult<AssetSensor> {
        self.repo
            .sensor_by_uuid(uuid)
            .await?
            .ok_or_else(|| ServiceError::not_found("Asset sensor", uuid))
    }

    pub async fn create_sensor(&self, asset_id: i32, new: NewSensor) -> ServiceResult<AssetSensor> {
        self.get_asset(asset_id).await?;
        let sensor = self.repo.insert_sensor(Uuid::new_v4(), asset_id, &new).await?;
        info!("Attached sensor {} ({}) to asset {}", sensor.id, sensor.sensor_path, asset_id);
        Ok(sensor)
    }

    pub async fn update_sensor(&self, id: i32, patch: SensorPatch) -> ServiceResult<AssetSensor> {
        let mut sensor = self.get_sensor(id).await?;
        patch.apply_to(&mut sensor);
        Ok(self.repo.save_sensor(&sensor).await?)
    }

    pub async fn delete_sensor(&self, id: i32) -> ServiceResult<bool> {
        Ok(self.repo.delete_sensor(id).await?)
    }
}
