//! Common error types for Scholia

use thiserror::Error;

/// Common result type for Scholia operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Scholia services
///
/// Mutating operations classify failures eagerly: `Validation` and
/// `Authorization` are raised before a transaction is opened, `Conflict`
/// and `Storage` surface from the write itself (after rollback).
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed a precondition check (empty title, unknown text, bad scheme)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Actor's privilege tier does not permit the operation
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Write collides with existing data (duplicate title, referenced row)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// JSON encode/decode error for stored documents
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (corrupt row, impossible state)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Remap a unique-constraint violation into a domain conflict.
    ///
    /// Used by call sites that insert uniquely-titled rows, so a duplicate
    /// surfaces as `Conflict` rather than a generic storage failure.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Error {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict(message.to_string())
            }
            _ => Error::Storage(err),
        }
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Authorization(_)
                | Error::Conflict(_)
                | Error::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Validation("x".into()).is_client_error());
        assert!(Error::Conflict("x".into()).is_client_error());
        assert!(!Error::Config("x".into()).is_client_error());
        assert!(!Error::Storage(sqlx::Error::PoolClosed).is_client_error());
    }

    #[test]
    fn test_conflict_on_unique_passthrough() {
        // Non-database errors must stay Storage
        let err = Error::conflict_on_unique(sqlx::Error::PoolClosed, "duplicate");
        assert!(matches!(err, Error::Storage(_)));
    }
}
