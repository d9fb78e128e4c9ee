//! Session lifecycle behavior: login, registration, refresh horizon, and
//! authoritative sign-out events.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use common::{fresh_session, near_expiry_session, FakeAuthApi, Harness};
use lifehub_core::SessionRecord;
use lifehub_store::LocalStore;
use lifehub_sync::{AuthEvent, SessionManager, SessionValidity, SyncConfig, SyncError};

fn session_manager(auth: FakeAuthApi) -> (SessionManager, LocalStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let store_view = LocalStore::open(dir.path()).unwrap();
    let manager = SessionManager::new(
        Arc::new(auth),
        Arc::new(store),
        Arc::new(SyncConfig::default()),
    );
    (manager, store_view, dir)
}

#[tokio::test]
async fn login_on_fresh_device_yields_empty_default_user_data() {
    let harness = Harness::with_parts(
        FakeAuthApi::new().with_account("a@b.com", "password1"),
        common::FakeDataApi::new(),
        SyncConfig::default(),
    );

    let initial = harness.ctx.init().await;
    assert!(!initial.is_authenticated);
    assert!(!initial.is_loading);

    let state = harness.ctx.login("a@b.com", "password1").await.unwrap();
    assert!(state.is_authenticated);
    assert_eq!(state.user_id.as_deref(), Some("user-a@b.com"));
    assert_eq!(
        state.user_data.as_ref().map(|d| d.total_records()),
        Some(0)
    );

    harness.ctx.teardown().await;
}

#[tokio::test]
async fn login_with_wrong_secret_fails() {
    let harness = Harness::with_parts(
        FakeAuthApi::new().with_account("a@b.com", "password1"),
        common::FakeDataApi::new(),
        SyncConfig::default(),
    );

    let result = harness.ctx.login("a@b.com", "wrong-password").await;
    assert!(matches!(result, Err(SyncError::InvalidCredentials)));

    let state = harness.ctx.state().await;
    assert!(!state.is_authenticated);
}

#[tokio::test]
async fn register_with_taken_identifier_is_distinguishable() {
    let harness = Harness::new();

    let first = harness
        .ctx
        .register("a@b.com", "password1", Some("Riley"))
        .await;
    assert!(first.is_ok());

    let second = harness.ctx.register("a@b.com", "password1", None).await;
    assert!(matches!(second, Err(SyncError::DuplicateIdentifier)));
}

#[tokio::test]
async fn register_rejects_malformed_input_before_any_network() {
    let harness = Harness::new();

    assert!(harness
        .ctx
        .register("not-an-email", "password1", None)
        .await
        .is_err());
    assert!(harness.ctx.register("a@b.com", "short", None).await.is_err());
}

#[tokio::test]
async fn still_valid_session_is_returned_unchanged() {
    let (manager, _store, _dir) = session_manager(FakeAuthApi::new());

    let record = fresh_session("u1");
    let token = record.access_token.clone();

    match manager.refresh_if_needed(record).await {
        SessionValidity::Valid(returned) => assert_eq!(returned.access_token, token),
        SessionValidity::Invalid => panic!("valid session reported invalid"),
    }
}

#[tokio::test]
async fn session_within_horizon_is_refreshed() {
    let (manager, store_view, _dir) = session_manager(FakeAuthApi::new());

    let record = near_expiry_session("u1");
    let old_token = record.access_token.clone();

    match manager.refresh_if_needed(record).await {
        SessionValidity::Valid(refreshed) => {
            assert_ne!(refreshed.access_token, old_token);
            assert!(refreshed.expires_at > Utc::now() + ChronoDuration::minutes(30));
            // The refreshed record also lands in the fast-path cache
            let cached = store_view.load_session().unwrap().unwrap();
            assert_eq!(cached.access_token, refreshed.access_token);
        }
        SessionValidity::Invalid => panic!("refresh should have succeeded"),
    }
}

#[tokio::test]
async fn failed_refresh_is_a_value_not_a_crash() {
    let auth = FakeAuthApi::new();
    auth.set_fail_refresh(true);
    let (manager, store_view, _dir) = session_manager(auth);

    let record = near_expiry_session("u1");
    store_view.save_session(&record).unwrap();

    assert_eq!(
        manager.refresh_if_needed(record).await,
        SessionValidity::Invalid
    );
    // The unusable session is also gone from the cache
    assert!(store_view.load_session().unwrap().is_none());
}

#[tokio::test]
async fn trial_session_never_refreshes() {
    let auth = FakeAuthApi::new();
    auth.set_fail_refresh(true);
    let (manager, _store, _dir) = session_manager(auth);

    let trial = SessionRecord::trial();
    match manager.refresh_if_needed(trial.clone()).await {
        SessionValidity::Valid(returned) => assert_eq!(returned.user_id, trial.user_id),
        SessionValidity::Invalid => panic!("trial session must stay valid"),
    }
}

#[tokio::test(start_paused = true)]
async fn expired_cached_session_is_returned_as_best_effort() {
    let auth = FakeAuthApi::new();
    auth.set_delay(Duration::from_secs(3600));
    let (manager, store_view, _dir) = session_manager(auth);

    let expired = SessionRecord::new("u1", "stale-token", Utc::now() - ChronoDuration::minutes(1));
    store_view.save_session(&expired).unwrap();

    // A false "logged out" is worse than a stale positive: the cached
    // record comes back without any network wait.
    let started = tokio::time::Instant::now();
    let resolved = manager.current_session().await;
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(resolved.map(|r| r.user_id), Some("u1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn empty_cache_with_hung_network_resolves_within_budget() {
    let auth = FakeAuthApi::new();
    auth.set_delay(Duration::from_secs(3600));
    let (manager, _store, _dir) = session_manager(auth);

    let budget = SyncConfig::default().timeouts.session_check();
    let started = tokio::time::Instant::now();
    let resolved = manager.current_session().await;

    assert!(resolved.is_none());
    let elapsed = started.elapsed();
    assert!(elapsed >= budget);
    assert!(elapsed < budget + Duration::from_secs(1));
}

#[tokio::test]
async fn signed_out_event_overrides_authenticated_state() {
    let harness = Harness::with_parts(
        FakeAuthApi::new().with_account("a@b.com", "password1"),
        common::FakeDataApi::new(),
        SyncConfig::default(),
    );

    harness.ctx.init().await;
    harness.ctx.login("a@b.com", "password1").await.unwrap();
    assert!(harness.ctx.state().await.is_authenticated);

    // The auth service pushes a sign-out (another device, token revoked…)
    harness.auth.emit(AuthEvent::SignedOut);

    // The listener applies it asynchronously
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = harness.ctx.state().await;
    assert!(!state.is_authenticated);
    assert!(harness.store_view.load_session().unwrap().is_none());

    harness.ctx.teardown().await;
}
