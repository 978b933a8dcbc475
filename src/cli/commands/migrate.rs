use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate().await?;
    DatabaseManager::close().await;
    output_success(output_format, "Database migrations applied", None)
}
