// handlers/protected/assets/mod.rs - /assets/* catalog endpoints
//
// Reads need asset:read. Writes check asset:create/update/delete, and item or
// sensor deployment checks asset:assign, before the asset service is called.
pub mod assets;
pub mod inventory;
pub mod items;
pub mod locations;
pub mod sensors;
pub mod templates;
