use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Reserved for optimistic concurrency on mark records. Writes are
    /// currently last-write-wins, so nothing raises it yet.
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StorageError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Errors that belong to a single mark entry rather than to the backend.
    /// Batch writes report these per row and keep going.
    pub fn is_entry_scoped(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_)
                | StorageError::Validation { .. }
                | StorageError::Conflict(_)
                | StorageError::ConstraintViolation(_)
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }
}
