mod common;

use common::{FakePush, PushMode, token};
use rattendance::errors::ErrorKind;
use rattendance::sync::{
    Backoff, SubscriptionHandle, SyncCoordinator, SyncSettings, SyncSignal, SyncState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};

fn settings() -> SyncSettings {
    SyncSettings {
        poll_interval: Duration::from_secs(30),
        coalesce_window: Duration::from_millis(500),
        backoff: Backoff::new(Duration::from_secs(1), Duration::from_secs(30)),
        max_reconnect_attempts: 3,
        idle_timeout: None,
    }
}

fn open(push: &Arc<FakePush>, settings: SyncSettings) -> (SubscriptionHandle, mpsc::UnboundedReceiver<SyncSignal>) {
    let coordinator = SyncCoordinator::new(push.clone(), settings);
    let handle = coordinator.open("B1", token()).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    handle.on_signal(move |s| {
        let _ = tx.send(s.clone());
    });
    (handle, rx)
}

#[tokio::test(start_paused = true)]
async fn test_poll_signal_arrives_when_push_is_down() {
    let push = Arc::new(FakePush::new(PushMode::Unreachable));
    let started = Instant::now();
    let (handle, mut rx) = open(&push, settings());

    let signal = timeout(Duration::from_millis(30_001), rx.recv())
        .await
        .expect("no signal within one poll interval")
        .unwrap();

    assert_eq!(signal.scope_id, "B1");
    assert!(signal.sources.poll);
    assert!(!signal.sources.push);
    assert!(started.elapsed() <= Duration::from_secs(30));
    assert!(push.connects() >= 2);
    assert_ne!(handle.state(), SyncState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_push_messages_is_one_signal() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let (handle, mut rx) = open(&push, settings());
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    for i in 0..5 {
        push.send(&format!("{{\"scope\":\"B1\",\"seq\":{i}}}"));
    }

    let signal = rx.recv().await.unwrap();
    assert_eq!(signal.merged, 5);
    assert!(signal.sources.push);

    // nothing else until the next poll tick
    assert!(timeout(Duration::from_secs(10), rx.recv()).await.is_err());
    assert_eq!(handle.signals_delivered(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_other_scopes_and_heartbeats_are_ignored() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let (handle, mut rx) = open(&push, settings());
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    push.send(r#"{"batchId":"B2"}"#);
    push.send_event(Some("ping"), "{}");
    assert!(timeout(Duration::from_secs(5), rx.recv()).await.is_err());

    push.send("attendance changed");
    let signal = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(signal.merged, 1);
}

#[tokio::test(start_paused = true)]
async fn test_push_and_poll_in_one_window_merge() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let mut s = settings();
    s.poll_interval = Duration::from_secs(10);
    let (handle, mut rx) = open(&push, s);
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    // push just before the poll tick at t = 10s
    sleep(Duration::from_millis(9_800)).await;
    push.send("x");

    let signal = rx.recv().await.unwrap();
    assert!(signal.sources.push && signal.sources.poll);
    assert_eq!(signal.merged, 2);
}

#[tokio::test(start_paused = true)]
async fn test_close_is_idempotent_and_final() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let (handle, mut rx) = open(&push, settings());
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    // trigger inside an open coalescing window, then close before it ends
    push.send("x");
    tokio::task::yield_now().await;
    handle.close();
    handle.close();

    assert!(handle.is_closed());
    assert_eq!(handle.state(), SyncState::Closed);

    sleep(Duration::from_secs(120)).await;
    // handlers were dropped on close, so the channel just ends
    assert!(rx.recv().await.is_none());
    assert_eq!(handle.signals_delivered(), 0);
    assert_eq!(push.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_stops_the_session() {
    let push = Arc::new(FakePush::new(PushMode::Unreachable));
    let (handle, _rx) = open(&push, settings());
    sleep(Duration::from_secs(2)).await;
    drop(handle);

    let connects = push.connects();
    sleep(Duration::from_secs(300)).await;
    assert_eq!(push.connects(), connects);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_stream_ends() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let (handle, _rx) = open(&push, settings());
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    push.drop_connection();
    handle.wait_for_state(|s| *s == SyncState::Reconnecting).await;
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    assert_eq!(push.connects(), 2);
    assert!(!handle.push_escalated());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_failures_escalate_but_polling_continues() {
    let push = Arc::new(FakePush::new(PushMode::Unreachable));
    let (handle, mut rx) = open(&push, settings());

    // attempts at 0s, 1s and 3s
    sleep(Duration::from_secs(8)).await;
    assert!(handle.push_escalated());
    assert!(!handle.push_auth_rejected());
    assert_eq!(handle.state(), SyncState::Reconnecting);

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(first.sources.poll && second.sources.poll);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credential_degrades_to_polling() {
    let push = Arc::new(FakePush::new(PushMode::RejectAuth));
    let (handle, mut rx) = open(&push, settings());

    let state = handle
        .wait_for_state(|s| *s == SyncState::Degraded)
        .await;
    assert_eq!(state, SyncState::Degraded);
    assert!(handle.push_auth_rejected());

    let signal = rx.recv().await.unwrap();
    assert!(signal.sources.poll);
    // never retried with the same credential
    assert_eq!(push.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_idle_push_connection_is_recycled() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let mut s = settings();
    s.idle_timeout = Some(Duration::from_secs(5));
    let (handle, _rx) = open(&push, s);
    handle.wait_for_state(|s| *s == SyncState::Connected).await;

    sleep(Duration::from_secs(7)).await;
    assert!(push.connects() >= 2);
}

#[tokio::test]
async fn test_open_requires_scope() {
    let push = Arc::new(FakePush::new(PushMode::Live));
    let coordinator = SyncCoordinator::new(push, SyncSettings::default());
    let err = coordinator.open("  ", token()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_backoff_is_capped_exponential() {
    let b = Backoff::new(Duration::from_millis(500), Duration::from_secs(5));
    let delays: Vec<u64> = (0..7).map(|n| b.delay(n).as_millis() as u64).collect();
    assert_eq!(delays, [500, 1000, 2000, 4000, 5000, 5000, 5000]);
    assert_eq!(b.delay(40), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_poll_signals_land_on_interval_boundaries() {
    let push = Arc::new(FakePush::new(PushMode::Unreachable));
    let mut s = settings();
    s.poll_interval = Duration::from_secs(10);
    s.coalesce_window = Duration::from_secs(2);
    let started = Instant::now();
    let (_handle, mut rx) = open(&push, s);

    for k in 1..=3u64 {
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(10 * k));
    }
}
