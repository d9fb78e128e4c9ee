//! # lifehub-core: Pure Data Model for Lifehub
//!
//! This crate is the **heart** of the Lifehub sync engine. It contains the
//! user data aggregate, the session record, and the reconciliation merge as
//! pure logic with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lifehub Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Modules (out of scope)                    │   │
//! │  │    Chat ──► Mood Tracking ──► Mock Research ──► Training UIs   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SyncContext                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lifehub-sync                                 │   │
//! │  │    sessions, bounded init, remote sync, auto-sync scheduler     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lifehub-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   merge   │  │ validation│  │   error   │  │   │
//! │  │   │ UserData  │  │ union-by- │  │identifier │  │  typed    │  │   │
//! │  │   │ Session   │  │ id merge  │  │ + secret  │  │  errors   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The UserData aggregate, domain records, and the session record
//! - [`merge`] - Pure reconciliation merge between local and remote aggregates
//! - [`error`] - Domain error types
//! - [`validation`] - Identifier and secret validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic except where it
//!    explicitly reads the clock or generates an ID
//! 2. **No I/O**: Storage, network, file system access is FORBIDDEN here
//! 3. **Synced Flag Discipline**: records only flip `unsynced -> synced`, the
//!    merge never drops or rewrites a local record
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod merge;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::CoreError;
pub use merge::merge_aggregate;
pub use types::{
    Domain, DomainRecord, SessionRecord, UserData, REFRESH_HORIZON_SECS, TRIAL_USER_PREFIX,
};
pub use validation::{validate_display_name, validate_identifier, validate_secret};
