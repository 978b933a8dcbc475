//! Role and permission tables plus the checker every privileged endpoint consults.
//!
//! Both the role -> permission map and the manageable-roles relation are plain
//! immutable tables built once on first access. The two tables are maintained
//! by hand and are not derived from one another.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Fixed authorization tier assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    PlantManager,
    SiteSupervisor,
    Technician,
    Operator,
    Analyst,
    Viewer,
    Customer,
    Contractor,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::PlantManager,
        Role::SiteSupervisor,
        Role::Technician,
        Role::Operator,
        Role::Analyst,
        Role::Viewer,
        Role::Customer,
        Role::Contractor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::PlantManager => "plant_manager",
            Role::SiteSupervisor => "site_supervisor",
            Role::Technician => "technician",
            Role::Operator => "operator",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
            Role::Customer => "customer",
            Role::Contractor => "contractor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Capability tag namespaced as `resource:action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "user:read")]
    UserRead,
    #[serde(rename = "user:create")]
    UserCreate,
    #[serde(rename = "user:update")]
    UserUpdate,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "user:admin")]
    UserAdmin,

    #[serde(rename = "asset:read")]
    AssetRead,
    #[serde(rename = "asset:create")]
    AssetCreate,
    #[serde(rename = "asset:update")]
    AssetUpdate,
    #[serde(rename = "asset:delete")]
    AssetDelete,
    #[serde(rename = "asset:assign")]
    AssetAssign,
    #[serde(rename = "asset:maintenance")]
    AssetMaintenance,

    #[serde(rename = "work_order:read")]
    WorkOrderRead,
    #[serde(rename = "work_order:create")]
    WorkOrderCreate,
    #[serde(rename = "work_order:update")]
    WorkOrderUpdate,
    #[serde(rename = "work_order:delete")]
    WorkOrderDelete,
    #[serde(rename = "work_order:assign")]
    WorkOrderAssign,
    #[serde(rename = "work_order:approve")]
    WorkOrderApprove,
    #[serde(rename = "work_order:close")]
    WorkOrderClose,

    #[serde(rename = "analytics:read")]
    AnalyticsRead,
    #[serde(rename = "analytics:advanced")]
    AnalyticsAdvanced,
    #[serde(rename = "report:generate")]
    ReportGenerate,
    #[serde(rename = "report:export")]
    ReportExport,
    #[serde(rename = "dashboard:customize")]
    DashboardCustomize,

    #[serde(rename = "system:config")]
    SystemConfig,
    #[serde(rename = "system:maintenance")]
    SystemMaintenance,
    #[serde(rename = "audit:read")]
    AuditLogRead,

    #[serde(rename = "plant:manage")]
    PlantManage,
    #[serde(rename = "site:supervise")]
    SiteSupervise,

    #[serde(rename = "realtime:monitor")]
    RealtimeMonitor,
    #[serde(rename = "realtime:control")]
    RealtimeControl,
    #[serde(rename = "alarm:manage")]
    AlarmManage,
}

impl Permission {
    pub const ALL: [Permission; 31] = [
        Permission::UserRead,
        Permission::UserCreate,
        Permission::UserUpdate,
        Permission::UserDelete,
        Permission::UserAdmin,
        Permission::AssetRead,
        Permission::AssetCreate,
        Permission::AssetUpdate,
        Permission::AssetDelete,
        Permission::AssetAssign,
        Permission::AssetMaintenance,
        Permission::WorkOrderRead,
        Permission::WorkOrderCreate,
        Permission::WorkOrderUpdate,
        Permission::WorkOrderDelete,
        Permission::WorkOrderAssign,
        Permission::WorkOrderApprove,
        Permission::WorkOrderClose,
        Permission::AnalyticsRead,
        Permission::AnalyticsAdvanced,
        Permission::ReportGenerate,
        Permission::ReportExport,
        Permission::DashboardCustomize,
        Permission::SystemConfig,
        Permission::SystemMaintenance,
        Permission::AuditLogRead,
        Permission::PlantManage,
        Permission::SiteSupervise,
        Permission::RealtimeMonitor,
        Permission::RealtimeControl,
        Permission::AlarmManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserCreate => "user:create",
            Permission::UserUpdate => "user:update",
            Permission::UserDelete => "user:delete",
            Permission::UserAdmin => "user:admin",
            Permission::AssetRead => "asset:read",
            Permission::AssetCreate => "asset:create",
            Permission::AssetUpdate => "asset:update",
            Permission::AssetDelete => "asset:delete",
            Permission::AssetAssign => "asset:assign",
            Permission::AssetMaintenance => "asset:maintenance",
            Permission::WorkOrderRead => "work_order:read",
            Permission::WorkOrderCreate => "work_order:create",
            Permission::WorkOrderUpdate => "work_order:update",
            Permission::WorkOrderDelete => "work_order:delete",
            Permission::WorkOrderAssign => "work_order:assign",
            Permission::WorkOrderApprove => "work_order:approve",
            Permission::WorkOrderClose => "work_order:close",
            Permission::AnalyticsRead => "analytics:read",
            Permission::AnalyticsAdvanced => "analytics:advanced",
            Permission::ReportGenerate => "report:generate",
            Permission::ReportExport => "report:export",
            Permission::DashboardCustomize => "dashboard:customize",
            Permission::SystemConfig => "system:config",
            Permission::SystemMaintenance => "system:maintenance",
            Permission::AuditLogRead => "audit:read",
            Permission::PlantManage => "plant:manage",
            Permission::SiteSupervise => "site:supervise",
            Permission::RealtimeMonitor => "realtime:monitor",
            Permission::RealtimeControl => "realtime:control",
            Permission::AlarmManage => "alarm:manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

static EMPTY_PERMISSIONS: Lazy<BTreeSet<Permission>> = Lazy::new(BTreeSet::new);

static ROLE_PERMISSIONS: Lazy<HashMap<Role, BTreeSet<Permission>>> = Lazy::new(|| {
    use Permission::*;

    #[rustfmt::skip]
    let table: [(Role, &[Permission]); 10] = [
        (
            Role::SuperAdmin,
            &[
                UserRead, UserCreate, UserUpdate, UserDelete, UserAdmin,
                AssetRead, AssetCreate, AssetUpdate, AssetDelete, AssetAssign, AssetMaintenance,
                WorkOrderRead, WorkOrderCreate, WorkOrderUpdate, WorkOrderDelete, WorkOrderAssign,
                WorkOrderApprove, WorkOrderClose,
                AnalyticsRead, AnalyticsAdvanced, ReportGenerate, ReportExport, DashboardCustomize,
                SystemConfig, SystemMaintenance, AuditLogRead,
                PlantManage, SiteSupervise,
                RealtimeMonitor, RealtimeControl, AlarmManage,
            ],
        ),
        (
            Role::Admin,
            &[
                UserRead, UserCreate, UserUpdate, UserAdmin,
                AssetRead, AssetCreate, AssetUpdate, AssetAssign, AssetMaintenance,
                WorkOrderRead, WorkOrderCreate, WorkOrderUpdate, WorkOrderAssign, WorkOrderApprove,
                WorkOrderClose,
                AnalyticsRead, AnalyticsAdvanced, ReportGenerate, ReportExport, DashboardCustomize,
                AuditLogRead, PlantManage,
                RealtimeMonitor, RealtimeControl, AlarmManage,
            ],
        ),
        (
            Role::PlantManager,
            &[
                UserRead,
                AssetRead, AssetUpdate, AssetAssign, AssetMaintenance,
                WorkOrderRead, WorkOrderCreate, WorkOrderUpdate, WorkOrderAssign, WorkOrderApprove,
                WorkOrderClose,
                AnalyticsRead, AnalyticsAdvanced, ReportGenerate, ReportExport, DashboardCustomize,
                PlantManage, SiteSupervise,
                RealtimeMonitor, RealtimeControl, AlarmManage,
            ],
        ),
        (
            Role::SiteSupervisor,
            &[
                UserRead,
                AssetRead, AssetUpdate, AssetMaintenance,
                WorkOrderRead, WorkOrderCreate, WorkOrderUpdate, WorkOrderAssign, WorkOrderClose,
                AnalyticsRead, ReportGenerate, DashboardCustomize,
                SiteSupervise,
                RealtimeMonitor, AlarmManage,
            ],
        ),
        (
            Role::Technician,
            &[
                UserRead,
                AssetRead, AssetMaintenance,
                WorkOrderRead, WorkOrderCreate, WorkOrderUpdate,
                AnalyticsRead, DashboardCustomize,
                RealtimeMonitor,
            ],
        ),
        (
            Role::Operator,
            &[
                UserRead,
                AssetRead,
                WorkOrderRead, WorkOrderCreate,
                AnalyticsRead, DashboardCustomize,
                RealtimeMonitor, RealtimeControl, AlarmManage,
            ],
        ),
        (
            Role::Analyst,
            &[
                UserRead,
                AssetRead,
                WorkOrderRead,
                AnalyticsRead, AnalyticsAdvanced, ReportGenerate, ReportExport, DashboardCustomize,
                RealtimeMonitor,
            ],
        ),
        (
            Role::Viewer,
            &[
                UserRead,
                AssetRead,
                WorkOrderRead,
                AnalyticsRead, DashboardCustomize,
                RealtimeMonitor,
            ],
        ),
        (
            Role::Customer,
            &[AssetRead, AnalyticsRead, DashboardCustomize, RealtimeMonitor],
        ),
        (
            Role::Contractor,
            &[AssetRead, WorkOrderRead, WorkOrderUpdate, RealtimeMonitor],
        ),
    ];

    table
        .into_iter()
        .map(|(role, permissions)| (role, permissions.iter().copied().collect()))
        .collect()
});

static MANAGEABLE_ROLES: Lazy<HashMap<Role, Vec<Role>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(Role::SuperAdmin, Role::ALL.to_vec());
    table.insert(
        Role::Admin,
        vec![
            Role::PlantManager,
            Role::SiteSupervisor,
            Role::Technician,
            Role::Operator,
            Role::Analyst,
            Role::Viewer,
            Role::Customer,
            Role::Contractor,
        ],
    );
    table.insert(
        Role::PlantManager,
        vec![Role::SiteSupervisor, Role::Technician, Role::Operator],
    );
    table.insert(Role::SiteSupervisor, vec![Role::Technician]);
    table
});

/// True iff `permission` is in the role's permission set. Unmapped roles have none.
pub fn has_permission(role: Role, permission: Permission) -> bool {
    get_user_permissions(role).contains(&permission)
}

/// Full permission set for a role (empty if unmapped)
pub fn get_user_permissions(role: Role) -> &'static BTreeSet<Permission> {
    ROLE_PERMISSIONS.get(&role).unwrap_or(&EMPTY_PERMISSIONS)
}

/// Check `resource:action`. Pairs that do not name a known permission are denied.
pub fn can_access_resource(role: Role, resource: &str, action: &str) -> bool {
    match format!("{}:{}", resource, action).parse::<Permission>() {
        Ok(permission) => has_permission(role, permission),
        Err(_) => false,
    }
}

/// Roles that `role` may create, assign or otherwise administer
pub fn get_manageable_roles(role: Role) -> &'static [Role] {
    MANAGEABLE_ROLES
        .get(&role)
        .map(|roles| roles.as_slice())
        .unwrap_or(&[])
}

pub fn can_manage_role(actor: Role, target: Role) -> bool {
    get_manageable_roles(actor).contains(&target)
}
