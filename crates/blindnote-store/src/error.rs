//! Error types for the store module.
//!
//! Every variant is a storage failure: a note that does not exist, has
//! expired, or was already consumed is reported as `Ok(None)`, not as an
//! error.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The operation did not finish within the configured bound.
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend could not be reached (poisoned lock, lost worker).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Repeated id collisions on create.
    #[error("could not allocate a unique note id after {0} attempts")]
    IdExhausted(u32),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
