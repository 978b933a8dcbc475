pub mod admin;
pub mod migrate;
pub mod roles;
pub mod seed;
