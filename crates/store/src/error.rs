//! Durable store error types.

use thiserror::Error;

/// Durable store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map a database error raised by an insert, turning unique violations
    /// into `AlreadyExists` and check violations into `Constraint`.
    pub(crate) fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::AlreadyExists(what.into());
            }
            if db.is_check_violation() || db.is_foreign_key_violation() {
                return Self::Constraint(db.message().to_string());
            }
        }
        Self::Database(err)
    }
}

/// Result type for durable store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_insert_passes_through_non_database_errors() {
        let err = StoreError::from_insert(sqlx::Error::RowNotFound, "player 'ada'");
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_display_includes_context() {
        let err = StoreError::NotFound("player 7".to_string());
        assert_eq!(err.to_string(), "not found: player 7");
    }
}
