//! # Bounded Initializer
//!
//! Startup orchestration with a hard wall-clock ceiling.
//!
//! ## Startup Race
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      initialize() Timeline                              │
//! │                                                                         │
//! │  t=0      ceiling timer armed (default 10s) — BEFORE any network call  │
//! │  t=0      session resolution: cache-first, slow path bounded (~2s)     │
//! │  t≈0–2s   session refresh if within the 5-minute horizon               │
//! │  t≈0–5s   remote fetch: per-domain parallel, each bounded (~3s)        │
//! │  t≈0–5s   merge with local cache, persist, decided state               │
//! │                                                                         │
//! │  ceiling fires first? → degrade to the local cache, synchronously:     │
//! │    cached session  → authenticated + locally-cached aggregate          │
//! │    no cached session → unauthenticated                                 │
//! │                                                                         │
//! │  EITHER WAY the caller gets a decided state. There is no path on       │
//! │  which the UI can be left loading indefinitely.                        │
//! │                                                                         │
//! │  Config validation guarantees ceiling > session budget + fetch budget, │
//! │  so the ceiling never fires while inner work is still within budget.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use lifehub_core::{merge_aggregate, UserData};
use lifehub_store::LocalStore;

use crate::config::SyncConfig;
use crate::deadline::{race_deadline, DeadlineOutcome};
use crate::remote::RemoteSyncClient;
use crate::session::{SessionManager, SessionValidity};
use crate::state::SyncState;

/// Startup orchestrator.
pub struct BoundedInitializer {
    session: Arc<SessionManager>,
    remote: Arc<RemoteSyncClient>,
    store: Arc<LocalStore>,
    config: Arc<SyncConfig>,
}

impl BoundedInitializer {
    /// Creates an initializer.
    pub fn new(
        session: Arc<SessionManager>,
        remote: Arc<RemoteSyncClient>,
        store: Arc<LocalStore>,
        config: Arc<SyncConfig>,
    ) -> Self {
        BoundedInitializer {
            session,
            remote,
            store,
            config,
        }
    }

    /// Produces a decided state within the hard ceiling, whatever the
    /// network is doing. Never fails.
    pub async fn initialize(&self) -> SyncState {
        let ceiling = self.config.timeouts.init_ceiling();

        match race_deadline(ceiling, self.resolve()).await {
            DeadlineOutcome::Completed(state) => state,
            DeadlineOutcome::DeadlineElapsed => {
                warn!(
                    ceiling_secs = ceiling.as_secs(),
                    "Initialization ceiling fired; degrading to local cache"
                );
                self.degraded_state()
            }
        }
    }

    /// The full startup sequence. Each leg is individually bounded, so this
    /// normally finishes well inside the ceiling.
    async fn resolve(&self) -> SyncState {
        // Session: cache-first; the slow path is bounded internally.
        let Some(record) = self.session.current_session().await else {
            info!("No session resolved; starting unauthenticated");
            return SyncState::unauthenticated();
        };

        let record = match self.session.refresh_if_needed(record).await {
            SessionValidity::Valid(record) => record,
            SessionValidity::Invalid => {
                info!("Cached session could not be refreshed; starting unauthenticated");
                return SyncState::unauthenticated();
            }
        };

        // The local cache is the floor: whatever the fetch does, we never
        // start with less than this.
        let local = match self.store.load_user_data() {
            Ok(data) => data.unwrap_or_else(UserData::empty),
            Err(e) => {
                warn!(%e, "Local aggregate unreadable at startup; starting empty");
                UserData::empty()
            }
        };

        if record.is_trial() {
            info!(user_id = %record.user_id, "Trial session restored");
            return SyncState::authenticated(&record, local);
        }

        // Best-effort initial fetch. fetch_all is structurally bounded (one
        // parallel, individually-guarded request per domain), so no extra
        // race is needed here; a dead network just yields empty domains.
        let fetched = self.remote.fetch_all(&record.user_id).await;
        let merged = merge_aggregate(&local, &fetched);

        if let Err(e) = self.store.save_user_data(&merged) {
            warn!(%e, "Failed to persist merged aggregate at startup");
        }

        info!(
            user_id = %record.user_id,
            records = merged.total_records(),
            "Initialized authenticated"
        );
        SyncState::authenticated(&record, merged)
    }

    /// Ceiling fallback: synchronous local reads only, so it resolves in
    /// microseconds once the deadline fires.
    fn degraded_state(&self) -> SyncState {
        match self.store.load_session() {
            Ok(Some(record)) => {
                let local = self
                    .store
                    .load_user_data()
                    .ok()
                    .flatten()
                    .unwrap_or_else(UserData::empty);
                info!(user_id = %record.user_id, "Degraded startup from cached session");
                SyncState::authenticated(&record, local)
            }
            _ => {
                info!("Degraded startup with no cached session");
                SyncState::unauthenticated()
            }
        }
    }
}
