pub mod asset_service;
pub mod error;
pub mod hierarchy;
pub mod user_service;

pub use asset_service::AssetService;
pub use error::{ServiceError, ServiceResult};
pub use user_service::{PermissionSummary, UserList, UserService};
