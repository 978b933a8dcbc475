// handlers/public/mod.rs - endpoints reachable without a bearer token
//
// Token acquisition and password recovery only.
pub mod auth;

pub use auth::{login_access_token, password_recovery};
