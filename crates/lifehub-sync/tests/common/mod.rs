//! In-memory fakes for the two consumed services, with programmable
//! delays and failures so timing and degradation behavior is testable
//! without sockets.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use lifehub_core::{Domain, DomainRecord, SessionRecord};
use lifehub_store::LocalStore;
use lifehub_sync::{
    AuthApi, AuthEvent, DataApi, NoOpEmitter, PushAck, RefreshResponse, RegisterResponse,
    SignInResponse, SyncConfig, SyncContext, SyncError, SyncResult,
};

// =============================================================================
// Fake Auth Service
// =============================================================================

pub struct FakeAuthApi {
    accounts: Mutex<HashMap<String, String>>,
    server_session: Mutex<Option<SessionRecord>>,
    delay: Mutex<Duration>,
    fail_refresh: AtomicBool,
    pub sign_in_calls: AtomicUsize,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeAuthApi {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        FakeAuthApi {
            accounts: Mutex::new(HashMap::new()),
            server_session: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            fail_refresh: AtomicBool::new(false),
            sign_in_calls: AtomicUsize::new(0),
            events,
        }
    }

    pub fn with_account(self, identifier: &str, secret: &str) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(identifier.to_string(), secret.to_string());
        self
    }

    /// Every call waits this long before responding. Combined with a
    /// paused-clock test this simulates a hung network.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// What the slow-path session lookup reports.
    pub fn set_server_session(&self, session: Option<SessionRecord>) {
        *self.server_session.lock().unwrap() = session;
    }

    /// Pushes an event as the auth service would.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
    }

    fn user_id_for(identifier: &str) -> String {
        format!("user-{identifier}")
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn sign_in(&self, identifier: &str, secret: &str) -> SyncResult<SignInResponse> {
        self.simulate_latency().await;
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let accounts = self.accounts.lock().unwrap();
        match accounts.get(identifier) {
            Some(stored) if stored == secret => {
                let user_id = Self::user_id_for(identifier);
                let _ = self.events.send(AuthEvent::SignedIn {
                    user_id: user_id.clone(),
                });
                Ok(SignInResponse {
                    user_id,
                    access_token: Uuid::new_v4().to_string(),
                    expires_at: Utc::now() + ChronoDuration::hours(1),
                })
            }
            _ => Err(SyncError::InvalidCredentials),
        }
    }

    async fn register(
        &self,
        identifier: &str,
        secret: &str,
        _display_name: Option<&str>,
    ) -> SyncResult<RegisterResponse> {
        self.simulate_latency().await;

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(identifier) {
            return Err(SyncError::DuplicateIdentifier);
        }
        accounts.insert(identifier.to_string(), secret.to_string());
        Ok(RegisterResponse {
            user_id: Self::user_id_for(identifier),
        })
    }

    async fn refresh(&self, _access_token: &str) -> SyncResult<RefreshResponse> {
        self.simulate_latency().await;

        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(SyncError::InvalidCredentials);
        }
        Ok(RefreshResponse {
            access_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }

    async fn current_session(&self) -> SyncResult<Option<SessionRecord>> {
        self.simulate_latency().await;
        Ok(self.server_session.lock().unwrap().clone())
    }

    async fn sign_out(&self, _access_token: &str) -> SyncResult<()> {
        self.simulate_latency().await;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// =============================================================================
// Fake Remote Data Service
// =============================================================================

pub struct FakeDataApi {
    records: Mutex<HashMap<(String, Domain), Vec<DomainRecord>>>,
    delay: Mutex<Duration>,
    offline: AtomicBool,
    failing_domains: Mutex<HashSet<Domain>>,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl FakeDataApi {
    pub fn new() -> Self {
        FakeDataApi {
            records: Mutex::new(HashMap::new()),
            delay: Mutex::new(Duration::ZERO),
            offline: AtomicBool::new(false),
            failing_domains: Mutex::new(HashSet::new()),
            create_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Every request fails immediately, connection-refused style.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Requests for these domains fail; the rest succeed.
    pub fn set_failing_domains(&self, domains: &[Domain]) {
        *self.failing_domains.lock().unwrap() = domains.iter().copied().collect();
    }

    /// Seeds a record as if another device had pushed it.
    pub fn seed_record(&self, user_id: &str, domain: Domain, record: DomainRecord) {
        self.records
            .lock()
            .unwrap()
            .entry((user_id.to_string(), domain))
            .or_default()
            .push(record);
    }

    pub fn remote_count(&self, user_id: &str, domain: Domain) -> usize {
        self.records
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), domain))
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reachable(&self, domain: Domain) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Network("connection refused".into()));
        }
        if self.failing_domains.lock().unwrap().contains(&domain) {
            return Err(SyncError::Network(format!("{domain} endpoint returned 500")));
        }
        Ok(())
    }
}

#[async_trait]
impl DataApi for FakeDataApi {
    async fn list_domain(&self, user_id: &str, domain: Domain) -> SyncResult<Vec<DomainRecord>> {
        self.simulate_latency().await;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable(domain)?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), domain))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_record(
        &self,
        user_id: &str,
        domain: Domain,
        record: &DomainRecord,
    ) -> SyncResult<PushAck> {
        self.simulate_latency().await;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable(domain)?;

        let mut records = self.records.lock().unwrap();
        let slot = records.entry((user_id.to_string(), domain)).or_default();

        if slot.iter().any(|r| r.id == record.id) {
            return Ok(PushAck::Duplicate);
        }
        slot.push(record.clone());
        Ok(PushAck::Created)
    }
}

// =============================================================================
// Harness
// =============================================================================

/// One wired-up context over fakes and a throwaway store directory.
pub struct Harness {
    pub ctx: Arc<SyncContext>,
    pub auth: Arc<FakeAuthApi>,
    pub data: Arc<FakeDataApi>,
    /// A second handle onto the same store directory, for assertions.
    pub store_view: LocalStore,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(FakeAuthApi::new(), FakeDataApi::new(), SyncConfig::default())
    }

    pub fn with_parts(auth: FakeAuthApi, data: FakeDataApi, config: SyncConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let store_view = LocalStore::open(dir.path()).unwrap();

        let auth = Arc::new(auth);
        let data = Arc::new(data);

        let ctx = SyncContext::new(
            config,
            store,
            auth.clone(),
            data.clone(),
            Arc::new(NoOpEmitter),
        );

        Harness {
            ctx,
            auth,
            data,
            store_view,
            _dir: dir,
        }
    }

    /// Seeds the store with a cached session the way a previous run would
    /// have left it.
    pub fn seed_cached_session(&self, session: &SessionRecord) {
        self.store_view.save_session(session).unwrap();
    }
}

/// A session record that will not need refreshing during the test.
pub fn fresh_session(user_id: &str) -> SessionRecord {
    SessionRecord::new(
        user_id,
        Uuid::new_v4().to_string(),
        Utc::now() + ChronoDuration::hours(1),
    )
}

/// A session record inside the 5-minute refresh horizon.
pub fn near_expiry_session(user_id: &str) -> SessionRecord {
    SessionRecord::new(
        user_id,
        Uuid::new_v4().to_string(),
        Utc::now() + ChronoDuration::minutes(2),
    )
}
