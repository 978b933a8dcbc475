use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::permissions::Role;
use crate::types::nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub uuid: Uuid,
    pub email: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub is_active: bool,
    pub is_verified: bool,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub timezone: String,
    pub language: String,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i32,
    pub failed_login_attempts: i32,
    pub last_failed_login: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_id: Option<i32>,
    pub updated_by_id: Option<i32>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_id: Option<i32>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn compose_full_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name.trim(), last_name.trim()).trim().to_string()
    }
}

/// Profile fields visible to any user holding `user:read`
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: i32,
    pub uuid: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub is_active: bool,
    pub is_verified: bool,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub timezone: String,
    pub language: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            mobile: user.mobile.clone(),
            role: user.role,
            status: user.status,
            is_active: user.is_active,
            is_verified: user.is_verified,
            employee_id: user.employee_id.clone(),
            department: user.department.clone(),
            position: user.position.clone(),
            company: user.company.clone(),
            timezone: user.timezone.clone(),
            language: user.language.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Administrative view: public profile plus security and audit counters
#[derive(Debug, Clone, Serialize)]
pub struct UserAdmin {
    #[serde(flatten)]
    pub profile: UserPublic,
    pub login_count: i32,
    pub failed_login_attempts: i32,
    pub last_failed_login: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_by_id: Option<i32>,
    pub updated_by_id: Option<i32>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_id: Option<i32>,
}

impl From<&User> for UserAdmin {
    fn from(user: &User) -> Self {
        Self {
            profile: UserPublic::from(user),
            login_count: user.login_count,
            failed_login_attempts: user.failed_login_attempts,
            last_failed_login: user.last_failed_login,
            password_changed_at: user.password_changed_at,
            created_by_id: user.created_by_id,
            updated_by_id: user.updated_by_id,
            deleted_at: user.deleted_at,
            deleted_by_id: user.deleted_by_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 3, max = 100))]
    pub username: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 20))]
    pub mobile: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    #[validate(length(max = 50))]
    pub employee_id: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
}

fn default_role() -> Role {
    Role::Viewer
}

/// Insert-ready user row (password already hashed)
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub uuid: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub created_by_id: Option<i32>,
}

/// Profile update. Role and status are changed only through `UserRoleUpdate`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(min = 3, max = 100))]
    pub username: Option<Option<String>>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 20))]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 20))]
    pub mobile: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 50))]
    pub employee_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 200))]
    pub company: Option<Option<String>>,
    #[validate(length(min = 1, max = 50))]
    pub timezone: Option<String>,
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(username) = self.username {
            user.username = username;
        }
        let mut name_changed = false;
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
            name_changed = true;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
            name_changed = true;
        }
        if name_changed {
            user.full_name = Some(User::compose_full_name(&user.first_name, &user.last_name));
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(mobile) = self.mobile {
            user.mobile = mobile;
        }
        if let Some(employee_id) = self.employee_id {
            user.employee_id = employee_id;
        }
        if let Some(department) = self.department {
            user.department = department;
        }
        if let Some(position) = self.position {
            user.position = position;
        }
        if let Some(company) = self.company {
            user.company = company;
        }
        if let Some(timezone) = self.timezone {
            user.timezone = timezone;
        }
        if let Some(language) = self.language {
            user.language = language;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleUpdate {
    pub role: Role,
    pub status: Option<UserStatus>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordChange {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub role_distribution: Vec<RoleCount>,
    pub status_distribution: Vec<StatusCount>,
    pub department_distribution: Vec<DepartmentCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct StatusCount {
    pub status: UserStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}
