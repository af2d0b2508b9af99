use rusqlite::ErrorCode;
use thiserror::Error;

/// Main error type for the review store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration and schema errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Foreign key, NOT NULL or CHECK constraint rejected a write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Review not found: {0}")]
    ReviewNotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON conversion errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Map a failed write, lifting constraint failures out of the generic database variant.
    pub fn from_write(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            other => StoreError::Database(other),
        }
    }

    /// True for any of the not-found variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::CustomerNotFound(_) | StoreError::ItemNotFound(_) | StoreError::ReviewNotFound(_)
        )
    }
}

/// Convenient Result type using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::CustomerNotFound(42);
        assert_eq!(err.to_string(), "Customer not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_from_rusqlite() {
        let store_err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(store_err, StoreError::Database(_)));
        assert!(!store_err.is_not_found());
    }

    #[test]
    fn test_from_write_lifts_constraint_failures() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT NOT NULL);").unwrap();
        let err = conn
            .execute("INSERT INTO t (v) VALUES (NULL)", [])
            .unwrap_err();
        let store_err = StoreError::from_write(err);
        assert!(matches!(store_err, StoreError::Constraint(_)), "got {:?}", store_err);
        assert!(store_err.to_string().contains("NOT NULL"));
    }

    #[test]
    fn test_from_write_keeps_other_errors() {
        let store_err = StoreError::from_write(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(store_err, StoreError::Database(_)));
    }
}
