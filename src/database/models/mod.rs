pub mod asset;
pub mod user;

pub use asset::*;
pub use user::*;
