//! Bounded initialization: the app always reaches a decided state within
//! the hard ceiling, under zero, partial, and total network failure.
//!
//! All tests run on a paused clock, so "an hour of hung network" costs
//! microseconds of real time while the virtual elapsed time stays exact.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{fresh_session, near_expiry_session, FakeAuthApi, FakeDataApi, Harness};
use lifehub_core::{Domain, DomainRecord, UserData};
use lifehub_sync::SyncConfig;

fn ceiling() -> Duration {
    SyncConfig::default().timeouts.init_ceiling()
}

#[tokio::test(start_paused = true)]
async fn healthy_network_initializes_authenticated_with_remote_data() {
    let harness = Harness::new();
    let session = fresh_session("u1");
    harness.seed_cached_session(&session);
    harness.data.seed_record(
        "u1",
        Domain::Tasks,
        DomainRecord::new(json!({"title": "from remote"})),
    );

    let state = harness.ctx.init().await;

    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    let data = state.user_data.unwrap();
    assert_eq!(data.domain(Domain::Tasks).len(), 1);
    assert!(data.domain(Domain::Tasks)[0].synced);

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn total_network_failure_still_decides_within_the_ceiling() {
    let auth = FakeAuthApi::new();
    let data = FakeDataApi::new();
    // Both services hang far past any budget
    auth.set_delay(Duration::from_secs(3600));
    data.set_delay(Duration::from_secs(3600));

    let harness = Harness::with_parts(auth, data, SyncConfig::default());

    let started = tokio::time::Instant::now();
    let state = harness.ctx.init().await;
    let elapsed = started.elapsed();

    // Decided, not loading, and inside the ceiling: no cached session and
    // a dead network degrade to unauthenticated.
    assert!(!state.is_loading);
    assert!(!state.is_authenticated);
    assert!(elapsed <= ceiling() + Duration::from_millis(100));

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn cached_session_with_dead_network_initializes_from_local_store() {
    let auth = FakeAuthApi::new();
    let data = FakeDataApi::new();
    data.set_offline(true);

    let harness = Harness::with_parts(auth, data, SyncConfig::default());

    let session = fresh_session("u1");
    harness.seed_cached_session(&session);
    let mut local = UserData::empty();
    local.upsert(Domain::Tasks, DomainRecord::new(json!({"title": "cached"})));
    harness.store_view.save_user_data(&local).unwrap();

    let started = tokio::time::Instant::now();
    let state = harness.ctx.init().await;
    let elapsed = started.elapsed();

    // Fast path: cached session, immediate (refused-connection) fetch
    // degradation — nowhere near the ceiling.
    assert!(elapsed < Duration::from_secs(1));
    assert!(state.is_authenticated);
    assert_eq!(state.user_id.as_deref(), Some("u1"));
    let data = state.user_data.unwrap();
    assert_eq!(data.domain(Domain::Tasks).len(), 1);
    assert!(!data.domain(Domain::Tasks)[0].synced);

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_times_out_per_domain_and_keeps_local_data() {
    let auth = FakeAuthApi::new();
    let data = FakeDataApi::new();
    // Reachable but hung: every domain request runs into its own budget
    data.set_delay(Duration::from_secs(3600));

    let harness = Harness::with_parts(auth, data, SyncConfig::default());
    harness.seed_cached_session(&fresh_session("u1"));
    let mut local = UserData::empty();
    local.upsert(Domain::Habits, DomainRecord::new(json!({"name": "read"})));
    harness.store_view.save_user_data(&local).unwrap();

    let started = tokio::time::Instant::now();
    let state = harness.ctx.init().await;
    let elapsed = started.elapsed();

    // Domain fetches run in parallel, so the whole fetch costs one
    // per-domain budget, not seven
    let fetch_budget = SyncConfig::default().timeouts.domain_fetch();
    assert!(elapsed >= fetch_budget);
    assert!(elapsed < fetch_budget + Duration::from_secs(1));
    assert!(elapsed <= ceiling());

    assert!(state.is_authenticated);
    assert_eq!(
        state.user_data.unwrap().domain(Domain::Habits).len(),
        1
    );

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn partial_failure_keeps_the_healthy_domains() {
    let harness = Harness::new();
    harness.seed_cached_session(&fresh_session("u1"));
    harness.data.seed_record(
        "u1",
        Domain::Tasks,
        DomainRecord::new(json!({"title": "survives"})),
    );
    harness.data.set_failing_domains(&[Domain::Habits, Domain::Memories]);

    let state = harness.ctx.init().await;

    assert!(state.is_authenticated);
    let data = state.user_data.unwrap();
    // Healthy domain fetched; failing domains degrade to empty rather
    // than failing the whole startup
    assert_eq!(data.domain(Domain::Tasks).len(), 1);
    assert_eq!(data.domain(Domain::Habits).len(), 0);

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn near_expiry_session_is_refreshed_during_init() {
    let harness = Harness::new();
    let session = near_expiry_session("u1");
    let old_token = session.access_token.clone();
    harness.seed_cached_session(&session);

    let state = harness.ctx.init().await;

    assert!(state.is_authenticated);
    assert_ne!(state.access_token.as_deref(), Some(old_token.as_str()));

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_at_startup_decides_unauthenticated() {
    let auth = FakeAuthApi::new();
    auth.set_fail_refresh(true);
    let harness = Harness::with_parts(auth, FakeDataApi::new(), SyncConfig::default());
    harness.seed_cached_session(&near_expiry_session("u1"));

    let state = harness.ctx.init().await;

    // Degraded to a decided unauthenticated state — no error escaped to
    // the caller, no indefinite loading
    assert!(!state.is_loading);
    assert!(!state.is_authenticated);

    harness.ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn trial_session_restores_without_any_network() {
    let auth = FakeAuthApi::new();
    let data = FakeDataApi::new();
    auth.set_delay(Duration::from_secs(3600));
    data.set_delay(Duration::from_secs(3600));

    let harness = Harness::with_parts(auth, data, SyncConfig::default());
    harness.seed_cached_session(&lifehub_core::SessionRecord::trial());

    let started = tokio::time::Instant::now();
    let state = harness.ctx.init().await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(state.is_authenticated);
    assert!(state.is_trial_mode);

    harness.ctx.teardown().await;
}
