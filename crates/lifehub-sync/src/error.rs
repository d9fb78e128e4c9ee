//! # Sync Error Types
//!
//! Error types for session and sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Authentication │  │    Network      │  │     Remote Data         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ InvalidCreds    │  │  NetworkTimeout │  │  RemoteConflict (=ok)   │ │
//! │  │ EmailUnconfirmed│  │  Network        │  │  RemoteRejected         │ │
//! │  │ DuplicateIdent. │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  PROPAGATION POLICY:                                                   │
//! │  • initialization never throws to the UI — it degrades to a decided    │
//! │    state                                                               │
//! │  • interactive actions (login, register, force sync) propagate         │
//! │  • background pushes never propagate — the next cycle retries          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use lifehub_store::StoreError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering session, network, and remote-data failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Authentication Errors
    // =========================================================================
    /// The auth service rejected the identifier/secret pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but its email address is unconfirmed.
    #[error("email address not confirmed")]
    EmailUnconfirmed,

    /// Registration hit an already-registered identifier.
    ///
    /// Distinguishable from every other failure so callers can special-case
    /// it without surfacing a generic error.
    #[error("identifier already registered")]
    DuplicateIdentifier,

    /// Registration failed for any other reason.
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// An operation that requires a session ran without one.
    #[error("no active session")]
    NotAuthenticated,

    /// An operation that requires remote persistence ran in trial mode.
    #[error("unavailable in trial mode")]
    TrialMode,

    // =========================================================================
    // Network Errors
    // =========================================================================
    /// A request exceeded its time budget.
    #[error("network timeout after {0}s")]
    NetworkTimeout(u64),

    /// Any other transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    // =========================================================================
    // Remote Data Errors
    // =========================================================================
    /// The remote store already holds an equivalent record.
    ///
    /// Non-fatal: proof of existing durability, treated as success by the
    /// push path.
    #[error("remote store already has record {id}")]
    RemoteConflict { id: String },

    /// The remote store rejected a record. Fatal for that record this
    /// cycle; it stays unsynced and is retried later.
    #[error("remote store rejected record {id}: {reason}")]
    RemoteRejected { id: String, reason: String },

    // =========================================================================
    // Configuration / Input Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Malformed caller input (identifier, secret, display name).
    #[error(transparent)]
    Invalid(#[from] lifehub_core::CoreError),

    // =========================================================================
    // Storage / Serialization Errors
    // =========================================================================
    /// Local store failure.
    #[error("local store error: {0}")]
    Store(String),

    /// Payload (de)serialization failure.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::InvalidConfig(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::InvalidConfig(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the operation can be retried on a later cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::NetworkTimeout(_)
                | SyncError::Network(_)
                | SyncError::RemoteRejected { .. }
        )
    }

    /// Returns true if this failure means the session is unusable and the
    /// caller should force re-authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidCredentials
                | SyncError::EmailUnconfirmed
                | SyncError::NotAuthenticated
        )
    }

    /// Returns true for the duplicate-record response the push path treats
    /// as success.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::RemoteConflict { .. })
    }
}
