//! # Store Error Types

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure (missing directory, permissions, disk full).
    #[error("store I/O error: {0}")]
    Io(String),

    /// Value could not be encoded.
    #[error("store encode error: {0}")]
    Encode(String),

    /// Stored blob carries a schema version newer than this build supports.
    #[error("stored value has schema version {found}, this build supports up to {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// No platform data directory could be resolved.
    #[error("no local data directory available")]
    NoDataDir,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode(err.to_string())
    }
}
