//! In-memory repositories for unit tests.
//!
//! `MemoryStore` mirrors the Postgres schema's unique and foreign-key
//! constraints so services see the same `DatabaseError` variants they would
//! get from `PgStore`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::auth;
use crate::database::manager::DatabaseError;
use crate::database::models::*;
use crate::database::repository::{AssetRepository, UserRepository};
use crate::permissions::Role;
use crate::types::Page;

#[derive(Default)]
struct State {
    next_id: i32,
    users: BTreeMap<i32, User>,
    locations: BTreeMap<i32, Location>,
    templates: BTreeMap<i32, AssetTemplate>,
    inventory: BTreeMap<i32, StoreInventory>,
    assets: BTreeMap<i32, Asset>,
    items: BTreeMap<i32, AssetItem>,
    sensors: BTreeMap<i32, AssetSensor>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn window<'a, T: Clone + 'a>(rows: impl Iterator<Item = &'a T>, page: Page) -> Vec<T> {
    rows.skip(page.skip as usize).take(page.limit as usize).cloned().collect()
}

fn unique<'a, T: 'a>(
    rows: impl Iterator<Item = (&'a i32, &'a T)>,
    own_id: Option<i32>,
    constraint: &str,
    clashes: impl Fn(&T) -> bool,
) -> Result<(), DatabaseError> {
    for (id, row) in rows {
        if Some(*id) != own_id && clashes(row) {
            return Err(DatabaseError::UniqueViolation(constraint.to_string()));
        }
    }
    Ok(())
}

fn references<K: Ord, V>(map: &BTreeMap<K, V>, key: Option<K>, constraint: &str) -> Result<(), DatabaseError> {
    match key {
        Some(key) if !map.contains_key(&key) => Err(DatabaseError::ForeignKeyViolation(constraint.to_string())),
        _ => Ok(()),
    }
}

fn same_code(a: &Option<String>, b: &Option<String>) -> bool {
    a.is_some() && a == b
}

fn matches_search(user: &User, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        Some(&user.first_name),
        Some(&user.last_name),
        user.full_name.as_ref(),
        Some(&user.email),
        user.username.as_ref(),
        user.employee_id.as_ref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn user_matches(user: &User, filter: &UserFilter) -> bool {
    !user.is_deleted()
        && filter.role.map_or(true, |r| user.role == r)
        && filter.status.map_or(true, |s| user.status == s)
        && filter.department.as_ref().map_or(true, |d| user.department.as_ref() == Some(d))
        && filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or(true, |s| matches_search(user, s))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        Ok(self.state().users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn user_by_id_any(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email) && (include_deleted || !u.is_deleted()))
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.state().users.values().find(|u| u.username.as_deref() == Some(username)).cloned())
    }

    async fn user_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.state().users.values().find(|u| u.employee_id.as_deref() == Some(employee_id)).cloned())
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, DatabaseError> {
        let state = self.state();
        Ok(window(state.users.values().filter(|u| user_matches(u, filter)), page))
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<i64, DatabaseError> {
        Ok(self.state().users.values().filter(|u| user_matches(u, filter)).count() as i64)
    }

    async fn insert_user(&self, draft: &UserDraft) -> Result<User, DatabaseError> {
        let mut state = self.state();
        unique(state.users.iter(), None, "users_email_key", |u| u.email.eq_ignore_ascii_case(&draft.email))?;
        unique(state.users.iter(), None, "users_username_key", |u| same_code(&u.username, &draft.username))?;
        unique(state.users.iter(), None, "users_employee_id_key", |u| same_code(&u.employee_id, &draft.employee_id))?;

        let id = state.next_id();
        let now = Utc::now();
        let user = User {
            id,
            uuid: draft.uuid,
            email: draft.email.clone(),
            username: draft.username.clone(),
            hashed_password: draft.hashed_password.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            full_name: Some(draft.full_name.clone()),
            phone: draft.phone.clone(),
            mobile: draft.mobile.clone(),
            role: draft.role,
            status: UserStatus::Active,
            is_active: true,
            is_verified: false,
            employee_id: draft.employee_id.clone(),
            department: draft.department.clone(),
            position: draft.position.clone(),
            company: draft.company.clone(),
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            last_login: None,
            login_count: 0,
            failed_login_attempts: 0,
            last_failed_login: None,
            password_changed_at: Some(now),
            created_at: now,
            updated_at: now,
            created_by_id: draft.created_by_id,
            updated_by_id: None,
            deleted_at: None,
            deleted_by_id: None,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<User, DatabaseError> {
        let mut state = self.state();
        if !state.users.contains_key(&user.id) {
            return Err(DatabaseError::NotFound(format!("user {}", user.id)));
        }
        unique(state.users.iter(), Some(user.id), "users_email_key", |u| u.email.eq_ignore_ascii_case(&user.email))?;
        unique(state.users.iter(), Some(user.id), "users_username_key", |u| same_code(&u.username, &user.username))?;
        unique(state.users.iter(), Some(user.id), "users_employee_id_key", |u| {
            same_code(&u.employee_id, &user.employee_id)
        })?;

        let mut saved = user.clone();
        saved.updated_at = Utc::now();
        state.users.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn user_stats(&self) -> Result<UserStats, DatabaseError> {
        let state = self.state();
        let live: Vec<&User> = state.users.values().filter(|u| !u.is_deleted()).collect();

        let mut roles: BTreeMap<Role, i64> = BTreeMap::new();
        let mut statuses: Vec<StatusCount> = Vec::new();
        let mut departments: BTreeMap<String, i64> = BTreeMap::new();
        for user in &live {
            *roles.entry(user.role).or_default() += 1;
            match statuses.iter_mut().find(|s| s.status == user.status) {
                Some(entry) => entry.count += 1,
                None => statuses.push(StatusCount { status: user.status, count: 1 }),
            }
            if let Some(department) = &user.department {
                *departments.entry(department.clone()).or_default() += 1;
            }
        }

        let mut department_distribution: Vec<DepartmentCount> = departments
            .into_iter()
            .map(|(department, count)| DepartmentCount { department, count })
            .collect();
        department_distribution.sort_by(|a, b| b.count.cmp(&a.count));
        department_distribution.truncate(10);

        let total_users = live.len() as i64;
        let active_users = live.iter().filter(|u| u.is_active).count() as i64;
        Ok(UserStats {
            total_users,
            active_users,
            inactive_users: total_users - active_users,
            role_distribution: roles.into_iter().map(|(role, count)| RoleCount { role, count }).collect(),
            status_distribution: statuses,
            department_distribution,
        })
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, DatabaseError> {
        Ok(self.state().locations.get(&id).cloned())
    }

    async fn location_by_code(&self, code: &str) -> Result<Option<Location>, DatabaseError> {
        Ok(self.state().locations.values().find(|l| l.code.as_deref() == Some(code)).cloned())
    }

    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>, DatabaseError> {
        let state = self.state();
        let rows = state
            .locations
            .values()
            .filter(|l| filter.parent_id.map_or(true, |p| l.parent_id == Some(p)));
        Ok(window(rows, page))
    }

    async fn location_children(&self, id: i32) -> Result<Vec<Location>, DatabaseError> {
        Ok(self.state().locations.values().filter(|l| l.parent_id == Some(id)).cloned().collect())
    }

    async fn insert_location(&self, uuid: Uuid, new: &NewLocation) -> Result<Location, DatabaseError> {
        let mut state = self.state();
        unique(state.locations.iter(), None, "locations_code_key", |l| same_code(&l.code, &new.code))?;
        references(&state.locations, new.parent_id, "locations_parent_id_fkey")?;

        let id = state.next_id();
        let now = Utc::now();
        let location = Location {
            id,
            uuid,
            name: new.name.clone(),
            code: new.code.clone(),
            description: new.description.clone(),
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };
        state.locations.insert(id, location.clone());
        Ok(location)
    }

    async fn save_location(&self, location: &Location) -> Result<Location, DatabaseError> {
        let mut state = self.state();
        if !state.locations.contains_key(&location.id) {
            return Err(DatabaseError::NotFound(format!("location {}", location.id)));
        }
        unique(state.locations.iter(), Some(location.id), "locations_code_key", |l| {
            same_code(&l.code, &location.code)
        })?;
        references(&state.locations, location.parent_id, "locations_parent_id_fkey")?;

        let mut saved = location.clone();
        saved.updated_at = Utc::now();
        state.locations.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete_location(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state();
        if state.locations.values().any(|l| l.parent_id == Some(id)) {
            return Err(DatabaseError::ForeignKeyViolation("locations_parent_id_fkey".into()));
        }
        if state.assets.values().any(|a| a.location_id == Some(id)) {
            return Err(DatabaseError::ForeignKeyViolation("assets_location_id_fkey".into()));
        }
        Ok(state.locations.remove(&id).is_some())
    }

    async fn template_by_id(&self, id: i32) -> Result<Option<AssetTemplate>, DatabaseError> {
        Ok(self.state().templates.get(&id).cloned())
    }

    async fn template_by_code(&self, code: &str) -> Result<Option<AssetTemplate>, DatabaseError> {
        Ok(self.state().templates.values().find(|t| t.code.as_deref() == Some(code)).cloned())
    }

    async fn list_templates(&self, filter: &TemplateFilter, page: Page) -> Result<Vec<AssetTemplate>, DatabaseError> {
        let state = self.state();
        let rows = state.templates.values().filter(|t| {
            filter.asset_type.map_or(true, |a| t.asset_type == a) && filter.category.map_or(true, |c| t.category == c)
        });
        Ok(window(rows, page))
    }

    async fn insert_template(&self, uuid: Uuid, new: &NewTemplate) -> Result<AssetTemplate, DatabaseError> {
        let mut state = self.state();
        unique(state.templates.iter(), None, "asset_templates_code_key", |t| same_code(&t.code, &new.code))?;

        let id = state.next_id();
        let now = Utc::now();
        let template = AssetTemplate {
            id,
            uuid,
            name: new.name.clone(),
            code: new.code.clone(),
            asset_type: new.asset_type,
            category: new.category,
            manufacturer: new.manufacturer.clone(),
            model_number: new.model_number.clone(),
            description: new.description.clone(),
            default_config: new.default_config.clone(),
            unit_price: new.unit_price,
            license_duration_days: new.license_duration_days,
            created_at: now,
            updated_at: now,
        };
        state.templates.insert(id, template.clone());
        Ok(template)
    }

    async fn save_template(&self, template: &AssetTemplate) -> Result<AssetTemplate, DatabaseError> {
        let mut state = self.state();
        if !state.templates.contains_key(&template.id) {
            return Err(DatabaseError::NotFound(format!("template {}", template.id)));
        }
        unique(state.templates.iter(), Some(template.id), "asset_templates_code_key", |t| {
            same_code(&t.code, &template.code)
        })?;

        let mut saved = template.clone();
        saved.updated_at = Utc::now();
        state.templates.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete_template(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state();
        if state.assets.values().any(|a| a.template_id == Some(id))
            || state.items.values().any(|i| i.template_id == id)
            || state.inventory.values().any(|i| i.template_id == id)
        {
            return Err(DatabaseError::ForeignKeyViolation("asset_templates referenced".into()));
        }
        Ok(state.templates.remove(&id).is_some())
    }

    async fn inventory_by_id(&self, id: i32) -> Result<Option<StoreInventory>, DatabaseError> {
        Ok(self.state().inventory.get(&id).cloned())
    }

    async fn inventory_by_template(&self, template_id: i32) -> Result<Option<StoreInventory>, DatabaseError> {
        Ok(self.state().inventory.values().find(|i| i.template_id == template_id).cloned())
    }

    async fn list_inventory(&self, page: Page) -> Result<Vec<StoreInventory>, DatabaseError> {
        let state = self.state();
        Ok(window(state.inventory.values(), page))
    }

    async fn insert_inventory(&self, new: &NewInventory) -> Result<StoreInventory, DatabaseError> {
        let mut state = self.state();
        references(&state.templates, Some(new.template_id), "store_inventory_template_id_fkey")?;
        unique(state.inventory.iter(), None, "store_inventory_template_id_key", |i| i.template_id == new.template_id)?;

        let id = state.next_id();
        let inventory = StoreInventory {
            id,
            template_id: new.template_id,
            quantity: new.quantity,
            storage_location: new.storage_location.clone(),
            last_restocked: Utc::now(),
        };
        state.inventory.insert(id, inventory.clone());
        Ok(inventory)
    }

    async fn save_inventory(&self, inventory: &StoreInventory) -> Result<StoreInventory, DatabaseError> {
        let mut state = self.state();
        if !state.inventory.contains_key(&inventory.id) {
            return Err(DatabaseError::NotFound(format!("inventory {}", inventory.id)));
        }
        state.inventory.insert(inventory.id, inventory.clone());
        Ok(inventory.clone())
    }

    async fn delete_inventory(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.state().inventory.remove(&id).is_some())
    }

    async fn asset_by_id(&self, id: i32) -> Result<Option<Asset>, DatabaseError> {
        Ok(self.state().assets.get(&id).cloned())
    }

    async fn asset_by_uuid(&self, uuid: Uuid) -> Result<Option<Asset>, DatabaseError> {
        Ok(self.state().assets.values().find(|a| a.uuid == uuid).cloned())
    }

    async fn asset_by_code(&self, code: &str) -> Result<Option<Asset>, DatabaseError> {
        Ok(self.state().assets.values().find(|a| a.code.as_deref() == Some(code)).cloned())
    }

    async fn list_assets(&self, filter: &AssetFilter, page: Page) -> Result<Vec<Asset>, DatabaseError> {
        let state = self.state();
        let rows = state.assets.values().filter(|a| {
            filter.asset_type.map_or(true, |t| a.asset_type == t)
                && filter.status.map_or(true, |s| a.status == s)
                && filter.parent_id.map_or(true, |p| a.parent_id == Some(p))
                && filter.location_id.map_or(true, |l| a.location_id == Some(l))
        });
        Ok(window(rows, page))
    }

    async fn asset_children(&self, id: i32) -> Result<Vec<Asset>, DatabaseError> {
        Ok(self.state().assets.values().filter(|a| a.parent_id == Some(id)).cloned().collect())
    }

    async fn insert_asset(&self, draft: &AssetDraft) -> Result<Asset, DatabaseError> {
        let mut state = self.state();
        unique(state.assets.iter(), None, "assets_code_key", |a| same_code(&a.code, &draft.code))?;
        references(&state.assets, draft.parent_id, "assets_parent_id_fkey")?;
        references(&state.locations, draft.location_id, "assets_location_id_fkey")?;
        references(&state.templates, draft.template_id, "assets_template_id_fkey")?;
        references(&state.users, draft.created_by_id, "assets_created_by_id_fkey")?;

        let id = state.next_id();
        let now = Utc::now();
        let asset = Asset {
            id,
            uuid: draft.uuid,
            template_id: draft.template_id,
            name: draft.name.clone(),
            code: draft.code.clone(),
            asset_type: draft.asset_type,
            status: draft.status,
            parent_id: draft.parent_id,
            location_id: draft.location_id,
            installation_date: draft.installation_date,
            config: draft.config.clone(),
            realtime_data_tag: draft.realtime_data_tag.clone(),
            created_by_id: draft.created_by_id,
            created_at: now,
            updated_at: now,
        };
        state.assets.insert(id, asset.clone());
        Ok(asset)
    }

    async fn save_asset(&self, asset: &Asset) -> Result<Asset, DatabaseError> {
        let mut state = self.state();
        if !state.assets.contains_key(&asset.id) {
            return Err(DatabaseError::NotFound(format!("asset {}", asset.id)));
        }
        unique(state.assets.iter(), Some(asset.id), "assets_code_key", |a| same_code(&a.code, &asset.code))?;
        references(&state.assets, asset.parent_id, "assets_parent_id_fkey")?;
        references(&state.locations, asset.location_id, "assets_location_id_fkey")?;
        references(&state.templates, asset.template_id, "assets_template_id_fkey")?;

        let mut saved = asset.clone();
        saved.updated_at = Utc::now();
        state.assets.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete_asset(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state();
        if state.assets.values().any(|a| a.parent_id == Some(id)) {
            return Err(DatabaseError::ForeignKeyViolation("assets_parent_id_fkey".into()));
        }
        if state.items.values().any(|i| i.asset_id == id) {
            return Err(DatabaseError::ForeignKeyViolation("asset_items_asset_id_fkey".into()));
        }
        if state.sensors.values().any(|s| s.asset_id == id) {
            return Err(DatabaseError::ForeignKeyViolation("asset_sensors_asset_id_fkey".into()));
        }
        Ok(state.assets.remove(&id).is_some())
    }

    async fn item_by_id(&self, id: i32) -> Result<Option<AssetItem>, DatabaseError> {
        Ok(self.state().items.get(&id).cloned())
    }

    async fn list_items(&self, filter: &AssetItemFilter, page: Page) -> Result<Vec<AssetItem>, DatabaseError> {
        let state = self.state();
        let rows = state.items.values().filter(|i| {
            filter.asset_id.map_or(true, |a| i.asset_id == a) && filter.template_id.map_or(true, |t| i.template_id == t)
        });
        Ok(window(rows, page))
    }

    async fn insert_item(&self, draft: &AssetItemDraft) -> Result<AssetItem, DatabaseError> {
        let mut state = self.state();
        references(&state.assets, Some(draft.asset_id), "asset_items_asset_id_fkey")?;
        references(&state.templates, Some(draft.template_id), "asset_items_template_id_fkey")?;

        let id = state.next_id();
        let item = AssetItem {
            id,
            asset_id: draft.asset_id,
            template_id: draft.template_id,
            quantity: draft.quantity,
            deployed_at: Utc::now(),
            expires_at: draft.expires_at,
        };
        state.items.insert(id, item.clone());
        Ok(item)
    }

    async fn save_item(&self, item: &AssetItem) -> Result<AssetItem, DatabaseError> {
        let mut state = self.state();
        if !state.items.contains_key(&item.id) {
            return Err(DatabaseError::NotFound(format!("asset item {}", item.id)));
        }
        state.items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn delete_item(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.state().items.remove(&id).is_some())
    }

    async fn sensor_by_id(&self, id: i32) -> Result<Option<AssetSensor>, DatabaseError> {
        Ok(self.state().sensors.get(&id).cloned())
    }

    async fn sensor_by_uuid(&self, uuid: Uuid) -> Result<Option<AssetSensor>, DatabaseError> {
        Ok(self.state().sensors.values().find(|s| s.uuid == uuid).cloned())
    }

    async fn list_sensors(&self, filter: &SensorFilter, page: Page) -> Result<Vec<AssetSensor>, DatabaseError> {
        let state = self.state();
        let rows = state.sensors.values().filter(|s| {
            filter.asset_id.map_or(true, |a| s.asset_id == a)
                && filter.system_source.as_ref().map_or(true, |src| &s.system_source == src)
        });
        Ok(window(rows, page))
    }

    async fn insert_sensor(&self, uuid: Uuid, asset_id: i32, new: &NewSensor) -> Result<AssetSensor, DatabaseError> {
        let mut state = self.state();
        references(&state.assets, Some(asset_id), "asset_sensors_asset_id_fkey")?;

        let id = state.next_id();
        let now = Utc::now();
        let sensor = AssetSensor {
            id,
            uuid,
            asset_id,
            name: new.name.clone(),
            sensor_path: new.sensor_path.clone(),
            system_source: new.system_source.clone(),
            config: new.config.clone().unwrap_or_else(|| serde_json::json!({})),
            created_at: now,
            updated_at: now,
        };
        state.sensors.insert(id, sensor.clone());
        Ok(sensor)
    }

    async fn save_sensor(&self, sensor: &AssetSensor) -> Result<AssetSensor, DatabaseError> {
        let mut state = self.state();
        if !state.sensors.contains_key(&sensor.id) {
            return Err(DatabaseError::NotFound(format!("sensor {}", sensor.id)));
        }
        let mut saved = sensor.clone();
        saved.updated_at = Utc::now();
        state.sensors.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete_sensor(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.state().sensors.remove(&id).is_some())
    }
}

/// Insert an active user with the given role and password
pub async fn seed_user(store: &MemoryStore, email: &str, role: Role, password: &str) -> User {
    let (first_name, last_name) = ("Test".to_string(), role.as_str().to_string());
    let draft = UserDraft {
        uuid: Uuid::new_v4(),
        email: email.to_string(),
        username: None,
        hashed_password: auth::hash_password(password).expect("hash password"),
        full_name: User::compose_full_name(&first_name, &last_name),
        first_name,
        last_name,
        phone: None,
        mobile: None,
        role,
        employee_id: None,
        department: None,
        position: None,
        company: None,
        created_by_id: None,
    };
    store.insert_user(&draft).await.expect("seed user")
}
