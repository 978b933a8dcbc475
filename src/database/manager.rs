use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return DatabaseError::UniqueViolation(constraint),
                Some(FOREIGN_KEY_VIOLATION) => return DatabaseError::ForeignKeyViolation(constraint),
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::Migration(err.to_string())
    }
}

/// Process-wide owner of the platform connection pool
pub struct DatabaseManager {
    pool: OnceCell<PgPool>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pool: OnceCell::new(),
        })
    }

    /// Get the platform pool, connecting lazily on first use
    pub async fn main_pool() -> Result<PgPool, DatabaseError> {
        let pool = Self::instance()
            .pool
            .get_or_try_init(|| async {
                let settings = &config::config().database;
                let url = Self::connection_string(&settings.url)?;
                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(Duration::from_secs(settings.connection_timeout))
                    .connect(&url)
                    .await?;
                info!("Created database pool (max {} connections)", settings.max_connections);
                Ok::<PgPool, DatabaseError>(pool)
            })
            .await?;
        Ok(pool.clone())
    }

    fn connection_string(configured: &str) -> Result<String, DatabaseError> {
        if configured.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let url = url::Url::parse(configured).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::main_pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Apply the embedded schema migrations
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::main_pool().await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = Self::instance().pool.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
