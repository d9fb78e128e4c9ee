//! # lifehub-store: Local Store for Lifehub
//!
//! Durable, **synchronous** key-value persistence for the user data
//! aggregate and the cached session record.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lifehub Local Store                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   lifehub-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐ │   │
//! │  │  │ LocalStore  │  │  schema     │  │  atomic writes         │ │   │
//! │  │  │ (store.rs)  │  │ (envelope + │  │  (temp file + rename)  │ │   │
//! │  │  │             │  │  migration) │  │                        │ │   │
//! │  │  │ get/set per │  │ version tag │  │ a value is complete    │ │   │
//! │  │  │ logical key │  │ on every    │  │ or absent, never torn  │ │   │
//! │  │  │             │  │ stored blob │  │                        │ │   │
//! │  │  └─────────────┘  └─────────────┘  └─────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  CONTRACT:                                                             │
//! │  • reads/writes are synchronous and never suspend                      │
//! │  • one mutable blob per logical key, last write wins                   │
//! │  • a corrupt blob reads as absent (the engine degrades, it never       │
//! │    crashes on cache state)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod schema;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use schema::SCHEMA_VERSION;
pub use store::{LocalStore, KEY_SESSION, KEY_USER_DATA};
