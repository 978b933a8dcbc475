use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Domain-level outcomes surfaced by the user and asset services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound { entity, key: key.to_string() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation { field: field.into(), message: message.into() }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("Duplicate value violates {}", constraint))
            }
            DatabaseError::ForeignKeyViolation(constraint) => {
                ServiceError::Conflict(format!("Row is still referenced or references a missing row ({})", constraint))
            }
            other => ServiceError::Database(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
