//! User accounts: login bookkeeping, administration and soft delete.
//!
//! Every administrative operation takes the acting user and applies the
//! permission table, the manageable-roles relation and the self-action guards
//! before touching storage.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth;
use crate::database::models::*;
use crate::database::repository::UserRepository;
use crate::permissions::{self, Permission, Role};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::Page;

/// One page of users plus the total matching the filter
#[derive(Debug, Clone, Serialize)]
pub struct UserList {
    pub items: Vec<UserPublic>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// What the caller's role allows, as reported by the permission check endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSummary {
    pub user_id: i32,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub can_manage_users: bool,
    pub can_create_users: bool,
    pub can_update_users: bool,
    pub can_delete_users: bool,
    pub manageable_roles: Vec<Role>,
}

impl PermissionSummary {
    pub fn for_user(user: &User) -> Self {
        let role = user.role;
        Self {
            user_id: user.id,
            role,
            permissions: permissions::get_user_permissions(role).iter().copied().collect(),
            can_manage_users: permissions::has_permission(role, Permission::UserAdmin),
            can_create_users: permissions::has_permission(role, Permission::UserCreate),
            can_update_users: permissions::has_permission(role, Permission::UserUpdate),
            can_delete_users: permissions::has_permission(role, Permission::UserDelete),
            manageable_roles: permissions::get_manageable_roles(role).to_vec(),
        }
    }
}

fn require(actor: &User, permission: Permission, action: &str) -> ServiceResult<()> {
    if permissions::has_permission(actor.role, permission) {
        return Ok(());
    }
    warn!("User {} ({}) denied {}: missing {}", actor.id, actor.role, action, permission);
    Err(ServiceError::forbidden(format!("Not enough permissions to {}", action)))
}

fn require_manageable(actor: &User, role: Role, verb: &str) -> ServiceResult<()> {
    if permissions::can_manage_role(actor.role, role) {
        return Ok(());
    }
    warn!("User {} ({}) may not {} role {}", actor.id, actor.role, verb, role);
    Err(ServiceError::forbidden(format!("Cannot {} role: {}", verb, role)))
}

fn hash(password: &str) -> ServiceResult<String> {
    auth::hash_password(password).map_err(|e| ServiceError::validation("password", e.to_string()))
}

pub struct UserService<R> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Active user by id, for resolving token subjects
    pub async fn find_active(&self, id: i32) -> ServiceResult<Option<User>> {
        Ok(self.repo.user_by_id(id).await?)
    }

    /// Confirms the address belongs to a live account. Delivery of the
    /// recovery message is left to an outside mailer.
    pub async fn recover_password(&self, email: &str) -> ServiceResult<()> {
        let user = self
            .repo
            .user_by_email(email, false)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", email))?;
        info!("Password recovery requested for user {}", user.id);
        Ok(())
    }

    /// Check credentials and record the attempt on the account
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let Some(mut user) = self.repo.user_by_email(email, false).await? else {
            debug!("Login for unknown email {}", email);
            return Err(ServiceError::Unauthorized("Incorrect email or password".into()));
        };

        if !auth::verify_password(password, &user.hashed_password) {
            user.failed_login_attempts += 1;
            user.last_failed_login = Some(Utc::now());
            self.repo.save_user(&user).await?;
            warn!("Failed login for user {} ({} consecutive)", user.id, user.failed_login_attempts);
            return Err(ServiceError::Unauthorized("Incorrect email or password".into()));
        }

        if !user.is_active {
            return Err(ServiceError::validation("username", "Inactive user"));
        }

        user.last_login = Some(Utc::now());
        user.login_count += 1;
        user.failed_login_attempts = 0;
        let user = self.repo.save_user(&user).await?;
        info!("User {} logged in", user.id);
        Ok(user)
    }

    async fn ensure_unique(
        &self,
        own_id: Option<i32>,
        email: Option<&str>,
        username: Option<&str>,
        employee_id: Option<&str>,
    ) -> ServiceResult<()> {
        let clashes = |found: Option<User>| found.is_some_and(|u| Some(u.id) != own_id);

        if let Some(email) = email {
            if clashes(self.repo.user_by_email(email, true).await?) {
                return Err(ServiceError::conflict("A user with this email already exists"));
            }
        }
        if let Some(username) = username {
            if clashes(self.repo.user_by_username(username).await?) {
                return Err(ServiceError::conflict("A user with this username already exists"));
            }
        }
        if let Some(employee_id) = employee_id {
            if clashes(self.repo.user_by_employee_id(employee_id).await?) {
                return Err(ServiceError::conflict("A user with this employee ID already exists"));
            }
        }
        Ok(())
    }

    async fn insert(&self, new: NewUser, created_by: Option<i32>) -> ServiceResult<User> {
        self.ensure_unique(None, Some(&new.email), new.username.as_deref(), new.employee_id.as_deref())
            .await?;

        let draft = UserDraft {
            uuid: Uuid::new_v4(),
            full_name: User::compose_full_name(&new.first_name, &new.last_name),
            hashed_password: hash(&new.password)?,
            email: new.email,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            mobile: new.mobile,
            role: new.role,
            employee_id: new.employee_id,
            department: new.department,
            position: new.position,
            company: new.company,
            created_by_id: created_by,
        };
        Ok(self.repo.insert_user(&draft).await?)
    }

    pub async fn create_user(&self, actor: &User, new: NewUser) -> ServiceResult<User> {
        require(actor, Permission::UserCreate, "create users")?;
        require_manageable(actor, new.role, "create user with")?;

        let user = self.insert(new, Some(actor.id)).await?;
        info!("User {} created user {} with role {}", actor.id, user.id, user.role);
        Ok(user)
    }

    /// Seed an account without an acting user (bootstrap only)
    pub async fn create_initial_admin(&self, mut new: NewUser) -> ServiceResult<User> {
        new.role = Role::SuperAdmin;
        let user = self.insert(new, None).await?;
        info!("Created super admin {}", user.id);
        Ok(user)
    }

    pub async fn list_users(&self, actor: &User, filter: &UserFilter, page: Page) -> ServiceResult<UserList> {
        require(actor, Permission::UserRead, "read users")?;

        let users = self.repo.list_users(filter, page).await?;
        let total = self.repo.count_users(filter).await?;
        Ok(UserList {
            items: users.iter().map(UserPublic::from).collect(),
            total,
            page: page.number(),
            per_page: page.limit,
        })
    }

    pub async fn get_user(&self, actor: &User, id: i32) -> ServiceResult<User> {
        require(actor, Permission::UserRead, "read user details")?;
        self.load(id).await
    }

    async fn load(&self, id: i32) -> ServiceResult<User> {
        self.repo
            .user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    async fn apply_patch(&self, actor: &User, mut user: User, patch: UserPatch) -> ServiceResult<User> {
        let username = patch.username.clone().flatten();
        let employee_id = patch.employee_id.clone().flatten();
        self.ensure_unique(Some(user.id), patch.email.as_deref(), username.as_deref(), employee_id.as_deref())
            .await?;

        patch.apply_to(&mut user);
        user.updated_by_id = Some(actor.id);
        Ok(self.repo.save_user(&user).await?)
    }

    /// Profile edit for the caller's own account
    pub async fn update_profile(&self, actor: &User, patch: UserPatch) -> ServiceResult<User> {
        let user = self.load(actor.id).await?;
        self.apply_patch(actor, user, patch).await
    }

    pub async fn change_password(&self, actor: &User, change: PasswordChange) -> ServiceResult<User> {
        let mut user = self.load(actor.id).await?;
        if !auth::verify_password(&change.current_password, &user.hashed_password) {
            return Err(ServiceError::validation("current_password", "Incorrect current password"));
        }

        user.hashed_password = hash(&change.new_password)?;
        user.password_changed_at = Some(Utc::now());
        user.updated_by_id = Some(actor.id);
        let user = self.repo.save_user(&user).await?;
        info!("User {} changed their password", user.id);
        Ok(user)
    }

    pub async fn update_user(&self, actor: &User, id: i32, patch: UserPatch) -> ServiceResult<User> {
        require(actor, Permission::UserUpdate, "update users")?;
        let user = self.load(id).await?;
        self.apply_patch(actor, user, patch).await
    }

    pub async fn update_user_role(&self, actor: &User, id: i32, update: UserRoleUpdate) -> ServiceResult<User> {
        require(actor, Permission::UserAdmin, "update user roles")?;
        let mut user = self.load(id).await?;
        require_manageable(actor, update.role, "assign")?;
        if id == actor.id {
            return Err(ServiceError::forbidden("Cannot change your own role"));
        }

        let previous = user.role;
        user.role = update.role;
        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_by_id = Some(actor.id);
        let user = self.repo.save_user(&user).await?;
        info!("User {} changed role of {} from {} to {}", actor.id, user.id, previous, user.role);
        Ok(user)
    }

    /// Returns the updated user and the one-time temporary password
    pub async fn reset_password(&self, actor: &User, id: i32) -> ServiceResult<(User, String)> {
        require(actor, Permission::UserAdmin, "reset passwords")?;
        let mut user = self.load(id).await?;

        let temporary = auth::generate_temporary_password();
        user.hashed_password = hash(&temporary)?;
        user.password_changed_at = Some(Utc::now());
        user.updated_by_id = Some(actor.id);
        let user = self.repo.save_user(&user).await?;
        info!("User {} reset the password of {}", actor.id, user.id);
        Ok((user, temporary))
    }

    pub async fn delete_user(&self, actor: &User, id: i32) -> ServiceResult<User> {
        require(actor, Permission::UserDelete, "delete users")?;
        let mut user = self.load(id).await?;
        if id == actor.id {
            return Err(ServiceError::forbidden("Cannot delete your own account"));
        }
        if user.role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
            return Err(ServiceError::forbidden("Cannot delete super admin user"));
        }

        user.deleted_at = Some(Utc::now());
        user.deleted_by_id = Some(actor.id);
        user.is_active = false;
        user.status = UserStatus::Inactive;
        let user = self.repo.save_user(&user).await?;
        info!("User {} soft-deleted user {}", actor.id, user.id);
        Ok(user)
    }

    pub async fn restore_user(&self, actor: &User, id: i32) -> ServiceResult<User> {
        if actor.role != Role::SuperAdmin {
            return Err(ServiceError::forbidden("Only super admin can restore deleted users"));
        }
        let mut user = match self.repo.user_by_id_any(id).await? {
            Some(user) if user.is_deleted() => user,
            _ => return Err(ServiceError::not_found("Deleted user", id)),
        };

        user.deleted_at = None;
        user.deleted_by_id = None;
        user.is_active = true;
        user.status = UserStatus::Active;
        user.updated_by_id = Some(actor.id);
        let user = self.repo.save_user(&user).await?;
        info!("User {} restored user {}", actor.id, user.id);
        Ok(user)
    }

    pub async fn stats(&self, actor: &User) -> ServiceResult<UserStats> {
        require(actor, Permission::UserRead, "view user statistics")?;
        Ok(self.repo.user_stats().await?)
    }
}
