//! # Session Manager
//!
//! Acquires, caches, refreshes, and destroys the authentication session.
//!
//! ## Session State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Lifecycle                                  │
//! │                                                                         │
//! │   Unauthenticated ──authenticate()──► Authenticating                   │
//! │         ▲                                   │                           │
//! │         │                             ok    ▼                           │
//! │         │                            Authenticated ◄──────────┐        │
//! │         │                                   │                  │        │
//! │         │                      near expiry  ▼            ok    │        │
//! │         │                              Refreshing ────────────┘        │
//! │         │                                   │                           │
//! │         └──── sign_out / refresh failure / SIGNED_OUT event ◄┘         │
//! │                                                                         │
//! │  SIGNED_OUT from the auth service is authoritative: it tears down      │
//! │  local session state even while other operations are in flight.        │
//! │                                                                         │
//! │  SESSION LOOKUP:                                                       │
//! │  1. Fast path: synchronous local-store cache read, no network          │
//! │  2. Slow path: network round-trip, bounded by session_check_secs       │
//! │     — on timeout the lookup degrades rather than reporting a false     │
//! │     "logged out"                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use lifehub_core::{validate_display_name, validate_identifier, validate_secret, SessionRecord};
use lifehub_store::LocalStore;

use crate::api::{AuthApi, AuthEvent};
use crate::config::SyncConfig;
use crate::deadline::{race_deadline, DeadlineOutcome};
use crate::error::SyncResult;

// =============================================================================
// Phase & Validity
// =============================================================================

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    Authenticated(SessionRecord),
    Refreshing(SessionRecord),
}

impl SessionPhase {
    /// The session record, if one is established.
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            SessionPhase::Authenticated(record) | SessionPhase::Refreshing(record) => {
                Some(record)
            }
            _ => None,
        }
    }
}

/// Result of a refresh check.
///
/// Refresh failure is a value, not an error: callers force
/// re-authentication instead of crashing a startup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidity {
    /// The session is usable (unchanged, or freshly refreshed).
    Valid(SessionRecord),

    /// The session could not be refreshed; the caller must re-authenticate.
    Invalid,
}

// =============================================================================
// Session Manager
// =============================================================================

/// Owns the session record and its lifecycle.
pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: Arc<LocalStore>,
    config: Arc<SyncConfig>,
    phase: RwLock<SessionPhase>,
}

impl SessionManager {
    /// Creates a session manager.
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<LocalStore>, config: Arc<SyncConfig>) -> Self {
        SessionManager {
            auth,
            store,
            config,
            phase: RwLock::new(SessionPhase::Unauthenticated),
        }
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.phase.read().await.clone()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchanges credentials for a session.
    ///
    /// Side effects: establishes the session record and writes the
    /// fast-path cache.
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> SyncResult<SessionRecord> {
        validate_identifier(identifier)?;
        validate_secret(secret)?;

        *self.phase.write().await = SessionPhase::Authenticating;

        match self.auth.sign_in(identifier, secret).await {
            Ok(response) => {
                let record = SessionRecord::new(
                    response.user_id,
                    response.access_token,
                    response.expires_at,
                );
                self.cache(&record);
                info!(user_id = %record.user_id, "Authenticated");
                *self.phase.write().await = SessionPhase::Authenticated(record.clone());
                Ok(record)
            }
            Err(e) => {
                *self.phase.write().await = SessionPhase::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Creates an account. Does not establish a session.
    pub async fn register(
        &self,
        identifier: &str,
        secret: &str,
        display_name: Option<&str>,
    ) -> SyncResult<String> {
        validate_identifier(identifier)?;
        validate_secret(secret)?;
        validate_display_name(display_name)?;

        let response = self.auth.register(identifier, secret, display_name).await?;
        info!(user_id = %response.user_id, "Registered");
        Ok(response.user_id)
    }

    /// Starts a trial session: sentinel identity, nothing remote.
    pub async fn start_trial(&self) -> SessionRecord {
        let record = SessionRecord::trial();
        self.cache(&record);
        info!(user_id = %record.user_id, "Trial session started");
        *self.phase.write().await = SessionPhase::Authenticated(record.clone());
        record
    }

    // =========================================================================
    // Session Lookup
    // =========================================================================

    /// Resolves the current session, cache-first.
    ///
    /// Never blocks longer than the configured slow-path budget. An expired
    /// cached record is still returned (best-effort positive); callers run
    /// it through [`refresh_if_needed`](Self::refresh_if_needed) before use.
    pub async fn current_session(&self) -> Option<SessionRecord> {
        // In-memory first: cheapest of all.
        if let Some(record) = self.phase.read().await.record() {
            return Some(record.clone());
        }

        // Fast path: synchronous cache read, no network.
        match self.store.load_session() {
            Ok(Some(record)) => {
                if record.is_expired() {
                    debug!("Cached session is expired; returning for refresh");
                }
                *self.phase.write().await = SessionPhase::Authenticated(record.clone());
                return Some(record);
            }
            Ok(None) => {}
            Err(e) => warn!(%e, "Session cache read failed; falling through to network"),
        }

        // Slow path: bounded network round-trip.
        let budget = self.config.timeouts.session_check();
        match race_deadline(budget, self.auth.current_session()).await {
            DeadlineOutcome::Completed(Ok(Some(record))) => {
                self.cache(&record);
                *self.phase.write().await = SessionPhase::Authenticated(record.clone());
                Some(record)
            }
            DeadlineOutcome::Completed(Ok(None)) => None,
            DeadlineOutcome::Completed(Err(e)) => {
                warn!(%e, "Slow-path session check failed; treating as signed out");
                None
            }
            DeadlineOutcome::DeadlineElapsed => {
                // With no cache there is no positive result to fall back to.
                warn!(
                    budget_secs = budget.as_secs(),
                    "Session check timed out with empty cache; signed-out state is ambiguous"
                );
                None
            }
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Refreshes a session that is within the expiry horizon.
    ///
    /// A still-valid session is returned unchanged. Trial sessions never
    /// refresh. Failure yields [`SessionValidity::Invalid`] so callers
    /// force re-authentication rather than crash.
    pub async fn refresh_if_needed(&self, record: SessionRecord) -> SessionValidity {
        if record.is_trial() || !record.needs_refresh() {
            return SessionValidity::Valid(record);
        }

        *self.phase.write().await = SessionPhase::Refreshing(record.clone());

        match self.auth.refresh(&record.access_token).await {
            Ok(response) => {
                let refreshed = SessionRecord::new(
                    record.user_id,
                    response.access_token,
                    response.expires_at,
                );
                self.cache(&refreshed);
                debug!(
                    user_id = %refreshed.user_id,
                    expires_at = %refreshed.expires_at,
                    "Session refreshed"
                );
                *self.phase.write().await = SessionPhase::Authenticated(refreshed.clone());
                SessionValidity::Valid(refreshed)
            }
            Err(e) => {
                warn!(%e, user_id = %record.user_id, "Session refresh failed");
                self.teardown_local().await;
                SessionValidity::Invalid
            }
        }
    }

    // =========================================================================
    // Sign-Out
    // =========================================================================

    /// Destroys the session locally and notifies the auth service.
    ///
    /// The remote leg is best-effort (and skipped entirely for trial
    /// sessions); local teardown always happens.
    pub async fn sign_out(&self) -> SyncResult<()> {
        let record = self.phase.read().await.record().cloned();
        let record = match record {
            Some(record) => Some(record),
            None => self.store.load_session().unwrap_or_default(),
        };

        if let Some(record) = record {
            if !record.is_trial() {
                if let Err(e) = self.auth.sign_out(&record.access_token).await {
                    warn!(%e, "Remote sign-out failed; proceeding with local teardown");
                }
            }
        }

        self.teardown_local().await;
        info!("Signed out");
        Ok(())
    }

    // =========================================================================
    // Auth Events
    // =========================================================================

    /// Applies an authoritative auth service event.
    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedOut => {
                debug!("Auth service reported sign-out; tearing down session");
                self.teardown_local().await;
            }
            AuthEvent::TokenRefreshed => {
                debug!("Auth service reported token refresh");
            }
            AuthEvent::SignedIn { user_id } => {
                debug!(%user_id, "Auth service reported sign-in");
            }
        }
    }

    /// Subscribes to the auth service's event stream.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AuthEvent> {
        self.auth.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Writes the fast-path cache. Caching is opportunistic: a failed write
    /// degrades the next startup to the slow path, nothing more.
    fn cache(&self, record: &SessionRecord) {
        if let Err(e) = self.store.save_session(record) {
            warn!(%e, "Failed to cache session record");
        }
    }

    async fn teardown_local(&self) {
        if let Err(e) = self.store.clear_session() {
            warn!(%e, "Failed to clear cached session");
        }
        *self.phase.write().await = SessionPhase::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_record_accessor() {
        assert!(SessionPhase::Unauthenticated.record().is_none());
        assert!(SessionPhase::Authenticating.record().is_none());

        let record = SessionRecord::trial();
        let phase = SessionPhase::Authenticated(record.clone());
        assert_eq!(phase.record(), Some(&record));
    }
}
