//! # Consumed Service Contracts
//!
//! Trait seams for the two external services the engine talks to, plus the
//! wire DTOs shared by their implementations.
//!
//! ## Why Traits Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Service Seams                                     │
//! │                                                                         │
//! │  SessionManager ──► dyn AuthApi  ──► HttpAuthClient   (production)     │
//! │                                  └─► in-memory fake   (tests)          │
//! │                                                                         │
//! │  RemoteSyncClient ─► dyn DataApi ──► HttpDataClient   (production)     │
//! │                                  └─► in-memory fake   (tests)          │
//! │                                                                         │
//! │  Every timing property in the test suite (bounded init, degraded       │
//! │  fetch, retry idempotence) is exercised against fakes with             │
//! │  programmable delays and failures — no sockets involved.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use lifehub_core::{Domain, DomainRecord, SessionRecord};

use crate::error::SyncResult;

// =============================================================================
// Auth Events
// =============================================================================

/// Push notifications from the auth service.
///
/// These are authoritative: a `SignedOut` must override local session state
/// even while other session operations are in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A session was established.
    SignedIn { user_id: String },

    /// The session was terminated (remotely or locally).
    SignedOut,

    /// The access token was rotated.
    TokenRefreshed,
}

// =============================================================================
// Wire DTOs
// =============================================================================

/// Successful sign-in response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user_id: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Successful token refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Successful registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Outcome of a single record push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAck {
    /// The remote store created the record.
    Created,

    /// The remote store already held an equivalent record (HTTP 409).
    /// Proof of durability, not an error.
    Duplicate,
}

// =============================================================================
// Auth Service
// =============================================================================

/// The authentication service contract.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a session.
    async fn sign_in(&self, identifier: &str, secret: &str) -> SyncResult<SignInResponse>;

    /// Creates an account.
    async fn register(
        &self,
        identifier: &str,
        secret: &str,
        display_name: Option<&str>,
    ) -> SyncResult<RegisterResponse>;

    /// Rotates an access token.
    async fn refresh(&self, access_token: &str) -> SyncResult<RefreshResponse>;

    /// Slow-path session lookup: asks the service who, if anyone, the
    /// caller currently is. Used only when the local cache is empty.
    async fn current_session(&self) -> SyncResult<Option<SessionRecord>>;

    /// Terminates the session on the service.
    async fn sign_out(&self, access_token: &str) -> SyncResult<()>;

    /// Subscribes to the service's push event stream.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

// =============================================================================
// Remote Data Service
// =============================================================================

/// The per-domain remote data service contract.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Lists every record in one domain for a user.
    async fn list_domain(&self, user_id: &str, domain: Domain) -> SyncResult<Vec<DomainRecord>>;

    /// Creates one record in one domain. A duplicate id yields
    /// [`PushAck::Duplicate`], never an error.
    async fn create_record(
        &self,
        user_id: &str,
        domain: Domain,
        record: &DomainRecord,
    ) -> SyncResult<PushAck>;
}
