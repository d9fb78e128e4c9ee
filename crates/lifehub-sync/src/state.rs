//! # Sync State
//!
//! The process-wide application state the engine maintains and the UI
//! reads, plus the event seam the embedding shell implements for
//! notifications.
//!
//! ## Decided-State Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncState Lifecycle                              │
//! │                                                                         │
//! │   construction ──► is_loading = true   (bounded init window ONLY)      │
//! │                         │                                               │
//! │        ┌────────────────┴─────────────────┐                            │
//! │        ▼                                  ▼                             │
//! │   authenticated + data            unauthenticated + no data            │
//! │   (is_loading = false)            (is_loading = false)                 │
//! │                                                                         │
//! │  After the init window the state is ALWAYS decided — never "unknown".  │
//! │  is_trial_mode = true ⇒ user_id is a sentinel and no remote            │
//! │  persistence happens anywhere.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use lifehub_core::{SessionRecord, UserData};

// =============================================================================
// Sync State
// =============================================================================

/// Process-wide session + data state. Not persisted; rebuilt on startup by
/// the bounded initializer.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Whether a session is established.
    pub is_authenticated: bool,

    /// The session's user, when authenticated.
    pub user_id: Option<String>,

    /// The session's bearer token, when authenticated.
    pub access_token: Option<String>,

    /// The aggregate, when authenticated (or in trial mode).
    pub user_data: Option<UserData>,

    /// True only during the bounded initialization window.
    pub is_loading: bool,

    /// True while a sync pass is running.
    pub is_syncing: bool,

    /// Completion time of the last successful sync pass.
    pub last_sync_time: Option<DateTime<Utc>>,

    /// Trial mode: sentinel identity, no remote persistence.
    pub is_trial_mode: bool,
}

impl SyncState {
    /// The undecided state: only valid inside the init window.
    pub fn loading() -> Self {
        SyncState {
            is_loading: true,
            ..Default::default()
        }
    }

    /// The decided unauthenticated state.
    pub fn unauthenticated() -> Self {
        SyncState::default()
    }

    /// The decided authenticated state.
    pub fn authenticated(session: &SessionRecord, user_data: UserData) -> Self {
        SyncState {
            is_authenticated: true,
            user_id: Some(session.user_id.clone()),
            access_token: Some(session.access_token.clone()),
            user_data: Some(user_data),
            is_loading: false,
            is_syncing: false,
            last_sync_time: None,
            is_trial_mode: session.is_trial(),
        }
    }
}

// =============================================================================
// Engine Status
// =============================================================================

/// Point-in-time status snapshot for external queries.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    /// Whether a session is established.
    pub is_authenticated: bool,

    /// Records awaiting remote confirmation.
    pub pending_count: usize,

    /// Whether a sync pass is running right now.
    pub is_syncing: bool,

    /// Completion time of the last successful sync pass.
    pub last_sync_time: Option<DateTime<Utc>>,

    /// Whether the session is a trial identity.
    pub is_trial_mode: bool,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for notifying the embedding shell of engine activity.
pub trait SyncEventEmitter: Send + Sync {
    /// The state changed (login, logout, init decision, data mutation).
    fn emit_state(&self, state: &SyncState);

    /// A sync pass made progress.
    fn emit_progress(&self, pending: usize, synced: usize);

    /// A sync pass failed.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter for tests and headless use.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_state(&self, _state: &SyncState) {}
    fn emit_progress(&self, _pending: usize, _synced: usize) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}
