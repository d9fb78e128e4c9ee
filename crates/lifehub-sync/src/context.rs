//! # Sync Context
//!
//! The one surface UI modules see. Owns the wiring of store, session
//! manager, remote client, engine, and scheduler, with an explicit
//! `init`/`teardown` lifecycle.
//!
//! ## Surface & Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SyncContext                                    │
//! │                                                                         │
//! │   SyncContext::new(config, store, auth, data, emitter)                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ctx.init()  ── bounded initialize ──► decided state                  │
//! │        │          + auth event listener                                 │
//! │        │          + scheduler (authenticated, non-trial only)           │
//! │        ▼                                                                │
//! │   login / register / logout / start_trial                              │
//! │   sync (forced reconciliation, errors surface)                         │
//! │   update_user_data (optimistic, never blocks on network)               │
//! │   state / status (snapshots)                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ctx.teardown()  ── stop scheduler, drop event listener               │
//! │                                                                         │
//! │  Instances are explicitly constructed and injected — there is no       │
//! │  module-level singleton, so tests run independent contexts in          │
//! │  parallel. UI modules never touch the store or the data service        │
//! │  directly.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lifehub_core::{merge_aggregate, Domain, DomainRecord, UserData};
use lifehub_store::LocalStore;

use crate::api::{AuthApi, AuthEvent, DataApi};
use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::http::{HttpAuthClient, HttpDataClient};
use crate::init::BoundedInitializer;
use crate::remote::{PushSummary, RemoteSyncClient};
use crate::scheduler::{AutoSyncScheduler, SchedulerHandle};
use crate::session::SessionManager;
use crate::state::{EngineStatus, NoOpEmitter, SyncEventEmitter, SyncState};

/// The application-facing sync context.
pub struct SyncContext {
    config: Arc<SyncConfig>,
    store: Arc<LocalStore>,
    session: Arc<SessionManager>,
    remote: Arc<RemoteSyncClient>,
    engine: Arc<SyncEngine>,
    state: Arc<RwLock<SyncState>>,
    emitter: Arc<dyn SyncEventEmitter>,
    scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
    event_listener: Mutex<Option<JoinHandle<()>>>,
}

impl SyncContext {
    /// Wires a context from injected collaborators.
    pub fn new(
        config: SyncConfig,
        store: LocalStore,
        auth: Arc<dyn AuthApi>,
        data: Arc<dyn DataApi>,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Arc<Self> {
        let config = Arc::new(config);
        let store = Arc::new(store);
        let state = Arc::new(RwLock::new(SyncState::loading()));

        let session = Arc::new(SessionManager::new(auth, store.clone(), config.clone()));
        let remote = Arc::new(RemoteSyncClient::new(data, config.clone()));
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            remote.clone(),
            state.clone(),
            emitter.clone(),
        ));

        Arc::new(SyncContext {
            config,
            store,
            session,
            remote,
            engine,
            state,
            emitter,
            scheduler: Arc::new(Mutex::new(None)),
            event_listener: Mutex::new(None),
        })
    }

    /// Wires a production context: HTTP clients, default store location.
    pub fn with_http(config: SyncConfig) -> SyncResult<Arc<Self>> {
        config.validate()?;
        let auth = Arc::new(HttpAuthClient::new(&config)?);
        let data = Arc::new(HttpDataClient::new(&config)?);
        let store = LocalStore::open_default()?;
        Ok(Self::new(config, store, auth, data, Arc::new(NoOpEmitter)))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bounded startup: always resolves to a decided state within the
    /// configured ceiling. Starts the auth event listener, and the
    /// scheduler when the decided state is an authenticated non-trial one.
    pub async fn init(&self) -> SyncState {
        let initializer = BoundedInitializer::new(
            self.session.clone(),
            self.remote.clone(),
            self.store.clone(),
            self.config.clone(),
        );

        let decided = initializer.initialize().await;
        *self.state.write().await = decided.clone();
        self.emitter.emit_state(&decided);

        self.spawn_event_listener().await;

        if decided.is_authenticated && !decided.is_trial_mode {
            self.start_scheduler().await;
        }

        decided
    }

    /// Stops background work. The context can be dropped afterwards.
    pub async fn teardown(&self) {
        self.stop_scheduler().await;
        if let Some(handle) = self.event_listener.lock().await.take() {
            handle.abort();
        }
        info!("Sync context torn down");
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Authenticates and transitions to a decided authenticated state with
    /// the locally-cached (or empty default) aggregate. A best-effort
    /// background fetch fills in remote data without blocking the caller.
    pub async fn login(&self, identifier: &str, secret: &str) -> SyncResult<SyncState> {
        let record = self.session.authenticate(identifier, secret).await?;

        let local = match self.store.load_user_data() {
            Ok(data) => data.unwrap_or_else(UserData::empty),
            Err(e) => {
                warn!(%e, "Local aggregate unreadable at login; starting empty");
                UserData::empty()
            }
        };

        let decided = SyncState::authenticated(&record, local);
        *self.state.write().await = decided.clone();
        self.emitter.emit_state(&decided);

        self.start_scheduler().await;
        self.spawn_initial_fetch(record.user_id);

        Ok(decided)
    }

    /// Creates an account. [`SyncError::DuplicateIdentifier`] is
    /// distinguishable so callers can special-case it; no UI feedback is
    /// triggered from here.
    ///
    /// [`SyncError::DuplicateIdentifier`]: crate::error::SyncError::DuplicateIdentifier
    pub async fn register(
        &self,
        identifier: &str,
        secret: &str,
        display_name: Option<&str>,
    ) -> SyncResult<String> {
        self.session.register(identifier, secret, display_name).await
    }

    /// Signs out: stops the scheduler, destroys the session (remote leg is
    /// best-effort, skipped in trial mode), and decides the state
    /// unauthenticated. The persisted aggregate stays on disk.
    pub async fn logout(&self) -> SyncResult<()> {
        self.stop_scheduler().await;
        self.session.sign_out().await?;

        let decided = SyncState::unauthenticated();
        *self.state.write().await = decided.clone();
        self.emitter.emit_state(&decided);
        Ok(())
    }

    /// Starts a trial session: sentinel identity, local persistence only,
    /// no scheduler.
    pub async fn start_trial(&self) -> SyncState {
        let record = self.session.start_trial().await;
        let local = self
            .store
            .load_user_data()
            .ok()
            .flatten()
            .unwrap_or_else(UserData::empty);

        let decided = SyncState::authenticated(&record, local);
        *self.state.write().await = decided.clone();
        self.emitter.emit_state(&decided);
        decided
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Optimistic local-first domain update. Never blocks on the network.
    pub async fn update_user_data(
        &self,
        domain: Domain,
        records: Vec<DomainRecord>,
    ) -> SyncResult<()> {
        self.engine.update_domain(domain, records).await
    }

    /// Forced reconciliation: push, fetch, merge, persist. Errors surface
    /// to the caller — this is the one path where the user asked to wait.
    pub async fn sync(&self) -> SyncResult<PushSummary> {
        self.engine.force_sync().await
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SyncState {
        self.engine.state().await
    }

    /// Point-in-time engine status.
    pub async fn status(&self) -> EngineStatus {
        self.engine.status().await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn start_scheduler(&self) {
        let mut slot = self.scheduler.lock().await;
        if let Some(old) = slot.take() {
            old.shutdown().await;
        }
        *slot = Some(AutoSyncScheduler::spawn(
            self.engine.clone(),
            self.config.scheduler.interval(),
        ));
    }

    async fn stop_scheduler(&self) {
        if let Some(handle) = self.scheduler.lock().await.take() {
            handle.shutdown().await;
        }
    }

    /// Best-effort post-login fetch: merge remote data into whatever the
    /// state holds by the time it lands. Failures are logged and left to
    /// the next sync pass.
    fn spawn_initial_fetch(&self, user_id: String) {
        let remote = self.remote.clone();
        let store = self.store.clone();
        let state = self.state.clone();
        let emitter = self.emitter.clone();

        tokio::spawn(async move {
            let fetched = remote.fetch_all(&user_id).await;

            let snapshot = {
                let mut s = state.write().await;
                let current = s.user_data.clone().unwrap_or_else(UserData::empty);
                let merged = merge_aggregate(&current, &fetched);
                if let Err(e) = store.save_user_data(&merged) {
                    warn!(%e, "Failed to persist post-login fetch");
                }
                s.user_data = Some(merged);
                s.clone()
            };

            emitter.emit_state(&snapshot);
        });
    }

    /// Listens to the auth service's push stream. Events are authoritative:
    /// a `SignedOut` tears session state down even while other operations
    /// are in flight.
    async fn spawn_event_listener(&self) {
        let mut slot = self.event_listener.lock().await;
        if let Some(old) = slot.take() {
            old.abort();
        }

        let session = self.session.clone();
        let state = self.state.clone();
        let emitter = self.emitter.clone();
        let scheduler = self.scheduler.clone();
        let mut rx = self.session.subscribe();

        *slot = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let signed_out = matches!(event, AuthEvent::SignedOut);
                        session.handle_event(event).await;

                        if signed_out {
                            if let Some(handle) = scheduler.lock().await.take() {
                                handle.shutdown().await;
                            }
                            let mut s = state.write().await;
                            if s.is_authenticated {
                                *s = SyncState::unauthenticated();
                                let snapshot = s.clone();
                                drop(s);
                                emitter.emit_state(&snapshot);
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}
