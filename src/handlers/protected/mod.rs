// handlers/protected/mod.rs - endpoints behind the JWT and user validation layers
//
// Every handler here receives `Extension<CurrentUser>`; permission checks use
// `CurrentUser::require` or happen inside the user service.
pub mod assets;
pub mod auth;
pub mod users;
