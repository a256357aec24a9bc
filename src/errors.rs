//! Unified error type for the store, the aggregation engine and the PIN lifecycle.

use sea_orm::DbErr;
use thiserror::Error;

/// Every failure the crate can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be opened or a connection could not be acquired.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Underlying reason reported by the engine
        message: String,
    },

    /// Malformed input rejected before any write.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the payload
        message: String,
    },

    /// Snapshot could not be parsed or written; the store is left unchanged.
    #[error("Import error: {message}")]
    Import {
        /// Reason the import was rolled back
        message: String,
    },

    /// Schema version on disk cannot be brought up to date.
    #[error("Migration error: {message}")]
    Migration {
        /// Reason the migration stopped
        message: String,
    },

    /// A record addressed by key does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Key that was looked up
        key: String,
    },

    /// Configuration file is invalid or holds an out-of-range value.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Any other database engine error.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        match value {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::StorageUnavailable {
                message: value.to_string(),
            },
            other => Self::Database(other),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
