//! # lifehub-sync: Session & Sync Engine for Lifehub
//!
//! This crate provides the client-side synchronization and session
//! lifecycle layer for Lifehub, enabling offline-first operation with
//! background sync to the remote store.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sync Engine Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  SyncContext (UI surface)                        │  │
//! │  │                                                                  │  │
//! │  │  init / teardown · login / register / logout · sync ·            │  │
//! │  │  update_user_data · state / status                               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼──────────────────────┐                 │
//! │         ▼                     ▼                      ▼                  │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ SessionManager │  │  SyncEngine    │  │  AutoSyncScheduler     │    │
//! │  │                │  │                │  │                        │    │
//! │  │ cache-first    │  │ optimistic     │  │ 60s push loop,         │    │
//! │  │ lookup, 5-min  │  │ updates,       │  │ single-flight with     │    │
//! │  │ refresh horizon│  │ force sync     │  │ manual sync            │    │
//! │  └───────┬────────┘  └───────┬────────┘  └────────────────────────┘    │
//! │          │                   │                                          │
//! │          ▼                   ▼                                          │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  dyn AuthApi   │  │ RemoteSyncClient (dyn DataApi)                  │
//! │  │  (HTTP / fake) │  │ parallel bounded fetch · 409-as-success push    │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  STARTUP (BoundedInitializer):                                         │
//! │  • hard ceiling armed before any network call (default 10s)            │
//! │  • session check bounded (~2s), per-domain fetch bounded (~3s)         │
//! │  • any timeout degrades to the local cache — the app ALWAYS reaches    │
//! │    a decided state, even fully offline                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`context`] - The injectable UI-facing context object
//! - [`session`] - Session manager (authenticate, refresh, sign-out, events)
//! - [`init`] - Bounded initializer
//! - [`remote`] - Remote sync client (fetch_all / push_unsynced)
//! - [`engine`] - Sync engine (optimistic updates, forced reconciliation)
//! - [`scheduler`] - Auto-sync scheduler
//! - [`api`] - Trait seams for the consumed services
//! - [`http`] - reqwest implementations of the service seams
//! - [`deadline`] - The race-against-deadline combinator
//! - [`config`] - Endpoints, time budgets, scheduler interval
//! - [`state`] - Process-wide sync state and the event emitter seam
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lifehub_sync::{SyncConfig, SyncContext};
//!
//! let config = SyncConfig::load_or_default(None);
//! let ctx = SyncContext::with_http(config)?;
//!
//! // Always resolves within the ceiling, network or not
//! let state = ctx.init().await;
//! println!("authenticated: {}", state.is_authenticated);
//!
//! // Optimistic, local-first mutation
//! ctx.update_user_data(Domain::Tasks, records).await?;
//!
//! // Explicit reconciliation
//! let summary = ctx.sync().await?;
//! println!("confirmed: {}", summary.confirmed());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod context;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod http;
pub mod init;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{AuthApi, AuthEvent, DataApi, PushAck, RefreshResponse, RegisterResponse, SignInResponse};
pub use config::{EndpointSettings, SchedulerSettings, SyncConfig, TimeoutSettings};
pub use context::SyncContext;
pub use deadline::{race_deadline, DeadlineOutcome};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use http::{HttpAuthClient, HttpDataClient};
pub use init::BoundedInitializer;
pub use remote::{PushSummary, RemoteSyncClient};
pub use scheduler::{AutoSyncScheduler, SchedulerHandle};
pub use session::{SessionManager, SessionPhase, SessionValidity};
pub use state::{EngineStatus, NoOpEmitter, SyncEventEmitter, SyncState};
