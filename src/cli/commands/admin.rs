use clap::Args;
use serde_json::json;
use validator::Validate;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::models::NewUser;
use crate::database::{DatabaseManager, PgStore};
use crate::permissions::Role;
use crate::services::UserService;

#[derive(Debug, Args)]
pub struct CreateAdminArgs {
    #[arg(long, help = "Login email")]
    pub email: String,

    #[arg(long, help = "Initial password (at least 8 characters)")]
    pub password: String,

    #[arg(long, default_value = "System")]
    pub first_name: String,

    #[arg(long, default_value = "Administrator")]
    pub last_name: String,
}

pub async fn handle(args: CreateAdminArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let new = NewUser {
        email: args.email,
        username: None,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        phone: None,
        mobile: None,
        role: Role::SuperAdmin,
        employee_id: None,
        department: None,
        position: None,
        company: None,
    };
    new.validate()?;

    let service = UserService::new(PgStore::connect().await?);
    let user = service.create_initial_admin(new).await?;
    DatabaseManager::close().await;

    output_success(
        output_format,
        &format!("Created super admin {}", user.email),
        Some(json!({ "id": user.id, "uuid": user.uuid, "email": user.email })),
    )
}
