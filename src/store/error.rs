//! Store errors

use std::fmt;

/// Errors raised by metadata stores and execution backends.
///
/// Database errors are carried as-is; callers map them to user-facing
/// responses.
#[derive(Debug)]
pub enum StoreError {
    /// Error reported by the database driver
    Database(sqlx::Error),
    /// A stored value could not be mapped onto a catalog or policy type
    Decode {
        entity: &'static str,
        message: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {}", err),
            StoreError::Decode { entity, message } => {
                write!(f, "Invalid stored {}: {}", entity, message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::Decode { .. } => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}
