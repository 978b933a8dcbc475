//! Postgres implementation of the repository traits.
//!
//! Constraint failures surface as `DatabaseError::UniqueViolation` /
//! `ForeignKeyViolation` through the `From<sqlx::Error>` translation, which is
//! what the services rely on when a concurrent writer wins a uniqueness race.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::*;
use crate::database::repository::{AssetRepository, UserRepository};
use crate::types::Page;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store over the process-wide pool
    pub async fn connect() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::main_pool().await?))
    }
}

fn search_pattern(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_id_any(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(email) = lower($1) AND ($2 OR deleted_at IS NULL)",
        )
        .bind(email)
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE employee_id = $1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE deleted_at IS NULL
              AND ($1::user_role IS NULL OR role = $1)
              AND ($2::user_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR department = $3)
              AND ($4::text IS NULL
                   OR first_name ILIKE $4 OR last_name ILIKE $4 OR full_name ILIKE $4
                   OR email ILIKE $4 OR username ILIKE $4 OR employee_id ILIKE $4)
            ORDER BY id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.role)
        .bind(filter.status)
        .bind(filter.department.as_deref())
        .bind(search_pattern(&filter.search))
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE deleted_at IS NULL
              AND ($1::user_role IS NULL OR role = $1)
              AND ($2::user_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR department = $3)
              AND ($4::text IS NULL
                   OR first_name ILIKE $4 OR last_name ILIKE $4 OR full_name ILIKE $4
                   OR email ILIKE $4 OR username ILIKE $4 OR employee_id ILIKE $4)
            "#,
        )
        .bind(filter.role)
        .bind(filter.status)
        .bind(filter.department.as_deref())
        .bind(search_pattern(&filter.search))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_user(&self, draft: &UserDraft) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                uuid, email, username, hashed_password, first_name, last_name, full_name,
                phone, mobile, role, employee_id, department, position, company, created_by_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(draft.uuid)
        .bind(&draft.email)
        .bind(&draft.username)
        .bind(&draft.hashed_password)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.full_name)
        .bind(&draft.phone)
        .bind(&draft.mobile)
        .bind(draft.role)
        .bind(&draft.employee_id)
        .bind(&draft.department)
        .bind(&draft.position)
        .bind(&draft.company)
        .bind(draft.created_by_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<User, DatabaseError> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = $2, username = $3, hashed_password = $4, first_name = $5,
                last_name = $6, full_name = $7, phone = $8, mobile = $9, role = $10,
                status = $11, is_active = $12, is_verified = $13, employee_id = $14,
                department = $15, position = $16, company = $17, timezone = $18,
                language = $19, last_login = $20, login_count = $21,
                failed_login_attempts = $22, last_failed_login = $23,
                password_changed_at = $24, updated_by_id = $25, deleted_at = $26,
                deleted_by_id = $27, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.mobile)
        .bind(user.role)
        .bind(user.status)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(&user.employee_id)
        .bind(&user.department)
        .bind(&user.position)
        .bind(&user.company)
        .bind(&user.timezone)
        .bind(&user.language)
        .bind(user.last_login)
        .bind(user.login_count)
        .bind(user.failed_login_attempts)
        .bind(user.last_failed_login)
        .bind(user.password_changed_at)
        .bind(user.updated_by_id)
        .bind(user.deleted_at)
        .bind(user.deleted_by_id)
        .fetch_optional(&self.pool)
        .await?;
        saved.ok_or_else(|| DatabaseError::NotFound(format!("user {}", user.id)))
    }

    async fn user_stats(&self) -> Result<UserStats, DatabaseError> {
        let role_distribution = sqlx::query_as::<_, RoleCount>(
            "SELECT role, COUNT(*) AS count FROM users WHERE deleted_at IS NULL GROUP BY role ORDER BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        let status_distribution = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM users WHERE deleted_at IS NULL GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let department_distribution = sqlx::query_as::<_, DepartmentCount>(
            r#"
            SELECT department, COUNT(*) AS count FROM users
            WHERE deleted_at IS NULL AND department IS NOT NULL
            GROUP BY department
            ORDER BY count DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (total_users, active_users): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active)
            FROM users WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            total_users,
            active_users,
            inactive_users: total_users - active_users,
            role_distribution,
            status_distribution,
            department_distribution,
        })
    }
}

#[async_trait]
impl AssetRepository for PgStore {
    // ---- Locations ----

    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, DatabaseError> {
        let row = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn location_by_code(&self, code: &str) -> Result<Option<Location>, DatabaseError> {
        let row = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>, DatabaseError> {
        let rows = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE ($1::int IS NULL OR parent_id = $1)
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(filter.parent_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn location_children(&self, id: i32) -> Result<Vec<Location>, DatabaseError> {
        let rows = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE parent_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_location(&self, uuid: Uuid, new: &NewLocation) -> Result<Location, DatabaseError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (uuid, name, code, description, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(uuid)
        .bind(&new.name)
        .bind(&new.code)
        .bind(&new.description)
        .bind(new.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_location(&self, location: &Location) -> Result<Location, DatabaseError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = $2, code = $3, description = $4, parent_id = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(&location.code)
        .bind(&location.description)
        .bind(location.parent_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("location {}", location.id)))
    }

    async fn delete_location(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Templates ----

    async fn template_by_id(&self, id: i32) -> Result<Option<AssetTemplate>, DatabaseError> {
        let row = sqlx::query_as::<_, AssetTemplate>("SELECT * FROM asset_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn template_by_code(&self, code: &str) -> Result<Option<AssetTemplate>, DatabaseError> {
        let row = sqlx::query_as::<_, AssetTemplate>("SELECT * FROM asset_templates WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_templates(&self, filter: &TemplateFilter, page: Page) -> Result<Vec<AssetTemplate>, DatabaseError> {
        let rows = sqlx::query_as::<_, AssetTemplate>(
            r#"
            SELECT * FROM asset_templates
            WHERE ($1::asset_type IS NULL OR asset_type = $1)
              AND ($2::template_category IS NULL OR category = $2)
            ORDER BY id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.asset_type)
        .bind(filter.category)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_template(&self, uuid: Uuid, new: &NewTemplate) -> Result<AssetTemplate, DatabaseError> {
        let row = sqlx::query_as::<_, AssetTemplate>(
            r#"
            INSERT INTO asset_templates (
                uuid, name, code, asset_type, category, manufacturer, model_number,
                description, default_config, unit_price, license_duration_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(uuid)
        .bind(&new.name)
        .bind(&new.code)
        .bind(new.asset_type)
        .bind(new.category)
        .bind(&new.manufacturer)
        .bind(&new.model_number)
        .bind(&new.description)
        .bind(&new.default_config)
        .bind(new.unit_price)
        .bind(new.license_duration_days)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_template(&self, template: &AssetTemplate) -> Result<AssetTemplate, DatabaseError> {
        let row = sqlx::query_as::<_, AssetTemplate>(
            r#"
            UPDATE asset_templates SET
                name = $2, code = $3, asset_type = $4, category = $5, manufacturer = $6,
                model_number = $7, description = $8, default_config = $9, unit_price = $10,
                license_duration_days = $11, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.code)
        .bind(template.asset_type)
        .bind(template.category)
        .bind(&template.manufacturer)
        .bind(&template.model_number)
        .bind(&template.description)
        .bind(&template.default_config)
        .bind(template.unit_price)
        .bind(template.license_duration_days)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("template {}", template.id)))
    }

    async fn delete_template(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM asset_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Store inventory ----

    async fn inventory_by_id(&self, id: i32) -> Result<Option<StoreInventory>, DatabaseError> {
        let row = sqlx::query_as::<_, StoreInventory>("SELECT * FROM store_inventory WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn inventory_by_template(&self, template_id: i32) -> Result<Option<StoreInventory>, DatabaseError> {
        let row = sqlx::query_as::<_, StoreInventory>("SELECT * FROM store_inventory WHERE template_id = $1")
            .bind(template_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_inventory(&self, page: Page) -> Result<Vec<StoreInventory>, DatabaseError> {
        let rows = sqlx::query_as::<_, StoreInventory>("SELECT * FROM store_inventory ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_inventory(&self, new: &NewInventory) -> Result<StoreInventory, DatabaseError> {
        let row = sqlx::query_as::<_, StoreInventory>(
            r#"
            INSERT INTO store_inventory (template_id, quantity, storage_location)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new.template_id)
        .bind(new.quantity)
        .bind(&new.storage_location)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_inventory(&self, inventory: &StoreInventory) -> Result<StoreInventory, DatabaseError> {
        let row = sqlx::query_as::<_, StoreInventory>(
            r#"
            UPDATE store_inventory
            SET quantity = $2, storage_location = $3, last_restocked = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(inventory.id)
        .bind(inventory.quantity)
        .bind(&inventory.storage_location)
        .bind(inventory.last_restocked)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("inventory {}", inventory.id)))
    }

    async fn delete_inventory(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM store_inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Assets ----

    async fn asset_by_id(&self, id: i32) -> Result<Option<Asset>, DatabaseError> {
        let row = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn asset_by_uuid(&self, uuid: Uuid) -> Result<Option<Asset>, DatabaseError> {
        let row = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn asset_by_code(&self, code: &str) -> Result<Option<Asset>, DatabaseError> {
        let row = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_assets(&self, filter: &AssetFilter, page: Page) -> Result<Vec<Asset>, DatabaseError> {
        let rows = sqlx::query_as::<_, Asset>(
            r#"
            SELECT * FROM assets
            WHERE ($1::asset_type IS NULL OR asset_type = $1)
              AND ($2::asset_status IS NULL OR status = $2)
              AND ($3::int IS NULL OR parent_id = $3)
              AND ($4::int IS NULL OR location_id = $4)
            ORDER BY id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.asset_type)
        .bind(filter.status)
        .bind(filter.parent_id)
        .bind(filter.location_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn asset_children(&self, id: i32) -> Result<Vec<Asset>, DatabaseError> {
        let rows = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE parent_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_asset(&self, draft: &AssetDraft) -> Result<Asset, DatabaseError> {
        let row = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (
                uuid, template_id, name, code, asset_type, status, parent_id, location_id,
                installation_date, config, realtime_data_tag, created_by_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(draft.uuid)
        .bind(draft.template_id)
        .bind(&draft.name)
        .bind(&draft.code)
        .bind(draft.asset_type)
        .bind(draft.status)
        .bind(draft.parent_id)
        .bind(draft.location_id)
        .bind(draft.installation_date)
        .bind(&draft.config)
        .bind(&draft.realtime_data_tag)
        .bind(draft.created_by_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_asset(&self, asset: &Asset) -> Result<Asset, DatabaseError> {
        let row = sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets SET
                template_id = $2, name = $3, code = $4, asset_type = $5, status = $6,
                parent_id = $7, location_id = $8, installation_date = $9, config = $10,
                realtime_data_tag = $11, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(asset.id)
        .bind(asset.template_id)
        .bind(&asset.name)
        .bind(&asset.code)
        .bind(asset.asset_type)
        .bind(asset.status)
        .bind(asset.parent_id)
        .bind(asset.location_id)
        .bind(asset.installation_date)
        .bind(&asset.config)
        .bind(&asset.realtime_data_tag)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("asset {}", asset.id)))
    }

    async fn delete_asset(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Deployed items ----

    async fn item_by_id(&self, id: i32) -> Result<Option<AssetItem>, DatabaseError> {
        let row = sqlx::query_as::<_, AssetItem>("SELECT * FROM asset_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_items(&self, filter: &AssetItemFilter, page: Page) -> Result<Vec<AssetItem>, DatabaseError> {
        let rows = sqlx::query_as::<_, AssetItem>(
            r#"
            SELECT * FROM asset_items
            WHERE ($1::int IS NULL OR asset_id = $1)
              AND ($2::int IS NULL OR template_id = $2)
            ORDER BY id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.asset_id)
        .bind(filter.template_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_item(&self, draft: &AssetItemDraft) -> Result<AssetItem, DatabaseError> {
        let row = sqlx::query_as::<_, AssetItem>(
            r#"
            INSERT INTO asset_items (asset_id, template_id, quantity, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(draft.asset_id)
        .bind(draft.template_id)
        .bind(draft.quantity)
        .bind(draft.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_item(&self, item: &AssetItem) -> Result<AssetItem, DatabaseError> {
        let row = sqlx::query_as::<_, AssetItem>(
            "UPDATE asset_items SET quantity = $2, expires_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.expires_at)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("asset item {}", item.id)))
    }

    async fn delete_item(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM asset_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Sensors ----

    async fn sensor_by_id(&self, id: i32) -> Result<Option<AssetSensor>, DatabaseError> {
        let row = sqlx::query_as::<_, AssetSensor>("SELECT * FROM asset_sensors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn sensor_by_uuid(&self, uuid: Uuid) -> Result<Option<AssetSensor>, DatabaseError> {
        let row = sqlx::query_as::<_, AssetSensor>("SELECT * FROM asset_sensors WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_sensors(&self, filter: &SensorFilter, page: Page) -> Result<Vec<AssetSensor>, DatabaseError> {
        let rows = sqlx::query_as::<_, AssetSensor>(
            r#"
            SELECT * FROM asset_sensors
            WHERE ($1::int IS NULL OR asset_id = $1)
              AND ($2::text IS NULL OR system_source = $2)
            ORDER BY id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.asset_id)
        .bind(filter.system_source.as_deref())
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_sensor(&self, uuid: Uuid, asset_id: i32, new: &NewSensor) -> Result<AssetSensor, DatabaseError> {
        let config = new.config.clone().unwrap_or_else(|| serde_json::json!({}));
        let row = sqlx::query_as::<_, AssetSensor>(
            r#"
            INSERT INTO asset_sensors (uuid, asset_id, name, sensor_path, system_source, config)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(uuid)
        .bind(asset_id)
        .bind(&new.name)
        .bind(&new.sensor_path)
        .bind(&new.system_source)
        .bind(config)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_sensor(&self, sensor: &AssetSensor) -> Result<AssetSensor, DatabaseError> {
        let row = sqlx::query_as::<_, AssetSensor>(
            r#"
            UPDATE asset_sensors
            SET name = $2, sensor_path = $3, system_source = $4, config = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(sensor.id)
        .bind(&sensor.name)
        .bind(&sensor.sensor_path)
        .bind(&sensor.system_source)
        .bind(&sensor.config)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("sensor {}", sensor.id)))
    }

    async fn delete_sensor(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM asset_sensors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
