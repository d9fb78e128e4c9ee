//! # Sync Engine
//!
//! Optimistic local-first updates plus forced reconciliation.
//!
//! ## Update & Sync Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncEngine Flow                                  │
//! │                                                                         │
//! │  update_domain(domain, records)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Local store write  ──── completes BEFORE any push is attempted     │
//! │  2. In-memory state update (optimistic: UI sees it immediately)        │
//! │  3. spawn background push  ─── failures logged, retried by scheduler   │
//! │                                                                         │
//! │  force_sync()                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  push_unsynced → fetch_all → merge → persist   (errors surface here)   │
//! │                                                                         │
//! │  SINGLE-FLIGHT GUARD:                                                  │
//! │  ────────────────────                                                  │
//! │  One async mutex wraps every sync pass. Overlapping passes could       │
//! │  double-submit a record before its synced flag lands, so:              │
//! │  • scheduler passes try_lock and SKIP when busy                        │
//! │  • manual force_sync and update-triggered pushes WAIT their turn       │
//! │                                                                         │
//! │  WRITE-BACK DISCIPLINE:                                                │
//! │  A pass works on a snapshot. On completion it folds only durability    │
//! │  evidence (synced flags, fetched records) into the live state, so      │
//! │  mutations made while the pass was in flight are never clobbered.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use lifehub_core::{merge_aggregate, Domain, DomainRecord, UserData};
use lifehub_store::LocalStore;

use crate::error::{SyncError, SyncResult};
use crate::remote::{PushSummary, RemoteSyncClient};
use crate::state::{EngineStatus, SyncEventEmitter, SyncState};

/// How a pass behaves when another pass holds the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassMode {
    /// Queue behind the running pass.
    Wait,

    /// Skip this cycle entirely (scheduler behavior).
    SkipIfBusy,
}

/// The sync engine: local-first mutation path plus reconciliation.
pub struct SyncEngine {
    store: Arc<LocalStore>,
    remote: Arc<RemoteSyncClient>,
    state: Arc<RwLock<SyncState>>,
    pass_guard: Arc<Mutex<()>>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl SyncEngine {
    /// Creates an engine over shared state.
    pub fn new(
        store: Arc<LocalStore>,
        remote: Arc<RemoteSyncClient>,
        state: Arc<RwLock<SyncState>>,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Self {
        SyncEngine {
            store,
            remote,
            state,
            pass_guard: Arc::new(Mutex::new(())),
            emitter,
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SyncState {
        self.state.read().await.clone()
    }

    /// Point-in-time status.
    pub async fn status(&self) -> EngineStatus {
        let state = self.state.read().await;
        EngineStatus {
            is_authenticated: state.is_authenticated,
            pending_count: state
                .user_data
                .as_ref()
                .map(UserData::unsynced_count)
                .unwrap_or(0),
            is_syncing: state.is_syncing,
            last_sync_time: state.last_sync_time,
            is_trial_mode: state.is_trial_mode,
        }
    }

    // =========================================================================
    // Optimistic Update Path
    // =========================================================================

    /// Replaces one domain's records: durable local write, immediate
    /// in-memory update, then a background push.
    ///
    /// The local write completes before the push is even attempted, so a
    /// crash right after this returns never loses the mutation. Push
    /// failures are swallowed (logged) here and retried by the scheduler;
    /// the UI never blocks on the network.
    pub async fn update_domain(
        &self,
        domain: Domain,
        records: Vec<DomainRecord>,
    ) -> SyncResult<()> {
        let push_as = {
            let mut state = self.state.write().await;

            let mut data = match state.user_data.clone() {
                Some(data) => data,
                None => self.store.load_user_data()?.unwrap_or_else(UserData::empty),
            };
            data.set_domain(domain, records);

            // Write-before-push ordering: this is the durability point.
            self.store.save_user_data(&data)?;
            state.user_data = Some(data);

            (state.is_authenticated && !state.is_trial_mode)
                .then(|| state.user_id.clone())
                .flatten()
        };

        self.emitter.emit_state(&self.state.read().await.clone());

        if let Some(user_id) = push_as {
            self.spawn_push(user_id);
        }

        Ok(())
    }

    /// Spawns a background push pass for the whole aggregate.
    fn spawn_push(&self, user_id: String) {
        let store = self.store.clone();
        let remote = self.remote.clone();
        let state = self.state.clone();
        let guard = self.pass_guard.clone();
        let emitter = self.emitter.clone();

        tokio::spawn(async move {
            Self::push_pass(store, remote, state, guard, emitter, user_id, PassMode::Wait)
                .await;
        });
    }

    // =========================================================================
    // Forced Reconciliation
    // =========================================================================

    /// Pushes, fetches, merges, and persists — the one path where the user
    /// explicitly expects a wait and an outcome, so errors propagate.
    pub async fn force_sync(&self) -> SyncResult<PushSummary> {
        let (user_id, is_trial) = {
            let state = self.state.read().await;
            (state.user_id.clone(), state.is_trial_mode)
        };
        let user_id = user_id.ok_or(SyncError::NotAuthenticated)?;
        if is_trial {
            return Err(SyncError::TrialMode);
        }

        let _permit = self.pass_guard.lock().await;
        self.set_syncing(true).await;

        let mut working = self.snapshot_data().await;
        let summary = self.remote.push_unsynced(&user_id, &mut working).await;

        let fetched = self.remote.fetch_all(&user_id).await;
        let reconciled = merge_aggregate(&working, &fetched);

        // Fold the reconciled result into whatever the state has become
        // while the pass was in flight.
        let (persist_result, snapshot) = {
            let mut state = self.state.write().await;
            let current = state.user_data.clone().unwrap_or_else(UserData::empty);
            let merged = merge_aggregate(&current, &reconciled);

            let persist_result = self.store.save_user_data(&merged);
            state.is_syncing = false;
            if persist_result.is_ok() {
                state.user_data = Some(merged);
                state.last_sync_time = Some(Utc::now());
            }
            (persist_result, state.clone())
        };

        self.emitter.emit_state(&snapshot);
        if let Some(data) = snapshot.user_data.as_ref() {
            self.emitter
                .emit_progress(data.unsynced_count(), summary.confirmed());
        }
        if !summary.is_clean() {
            self.emitter.emit_error(
                &format!("{} record(s) failed to sync", summary.failed),
                true,
            );
        }

        persist_result?;
        Ok(summary)
    }

    // =========================================================================
    // Scheduled Pass
    // =========================================================================

    /// One scheduler cycle: push-only, skipped entirely if a pass is
    /// already running. Never fails; the next cycle retries.
    pub async fn run_scheduled_pass(&self) {
        let user_id = {
            let state = self.state.read().await;
            (state.is_authenticated && !state.is_trial_mode)
                .then(|| state.user_id.clone())
                .flatten()
        };

        let Some(user_id) = user_id else {
            debug!("No pushable session; skipping scheduled pass");
            return;
        };

        Self::push_pass(
            self.store.clone(),
            self.remote.clone(),
            self.state.clone(),
            self.pass_guard.clone(),
            self.emitter.clone(),
            user_id,
            PassMode::SkipIfBusy,
        )
        .await;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// One push pass over a snapshot of the aggregate.
    async fn push_pass(
        store: Arc<LocalStore>,
        remote: Arc<RemoteSyncClient>,
        state: Arc<RwLock<SyncState>>,
        guard: Arc<Mutex<()>>,
        emitter: Arc<dyn SyncEventEmitter>,
        user_id: String,
        mode: PassMode,
    ) -> Option<PushSummary> {
        let _permit = match mode {
            PassMode::Wait => guard.lock().await,
            PassMode::SkipIfBusy => match guard.try_lock() {
                Ok(permit) => permit,
                Err(_) => {
                    debug!("Sync pass already in flight; skipping");
                    return None;
                }
            },
        };

        {
            state.write().await.is_syncing = true;
        }

        let mut working = {
            let s = state.read().await;
            s.user_data.clone().unwrap_or_else(UserData::empty)
        };

        let summary = remote.push_unsynced(&user_id, &mut working).await;

        let snapshot = {
            let mut s = state.write().await;
            match s.user_data.take() {
                Some(mut current) => {
                    // Fold in durability evidence only: records that were
                    // mutated or added mid-pass stay exactly as they are.
                    for (domain, record) in working.records().filter(|(_, r)| r.synced) {
                        current.mark_synced(domain, &record.id);
                    }
                    s.user_data = Some(current);
                }
                None => s.user_data = Some(working),
            }
            s.is_syncing = false;
            if summary.is_clean() {
                s.last_sync_time = Some(Utc::now());
            }
            s.clone()
        };

        if let Some(data) = snapshot.user_data.as_ref() {
            if let Err(e) = store.save_user_data(data) {
                warn!(%e, "Failed to persist aggregate after push pass");
            }
            emitter.emit_progress(data.unsynced_count(), summary.confirmed());
        }

        Some(summary)
    }

    async fn set_syncing(&self, syncing: bool) {
        self.state.write().await.is_syncing = syncing;
    }

    async fn snapshot_data(&self) -> UserData {
        self.state
            .read()
            .await
            .user_data
            .clone()
            .unwrap_or_else(UserData::empty)
    }
}
