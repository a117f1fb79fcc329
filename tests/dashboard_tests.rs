mod common;

use common::{FakeApi, batch, rec, roster, ts};
use rattendance::api::{DashboardApi, RecordBatch};
use rattendance::core::{Dashboard, RefreshOutcome};
use rattendance::errors::{AppError, ErrorKind};
use rattendance::models::{Filter, Summary};
use rattendance::sync::{SignalSources, SyncSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn dashboard(api: &Arc<FakeApi>, scope: &str) -> Arc<Dashboard> {
    let api: Arc<dyn DashboardApi> = api.clone();
    Arc::new(Dashboard::new(api, Filter::new(scope)))
}

async fn wait_for_fetches(api: &FakeApi, n: usize) {
    while api.fetches() < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_refresh_computes_summary_locally() {
    let api = Arc::new(FakeApi::new());
    let mut with_hint = batch(roster("B1", 18, 3, 4));
    // server hint disagrees; local numbers win
    with_hint.server_summary = Some(Summary::from_counts(25, 0, 0));
    api.push_fetch(Ok(with_hint));

    let d = dashboard(&api, "B1");
    match d.refresh().await {
        RefreshOutcome::Updated(s) => assert_eq!(s.percentage, 72),
        other => panic!("unexpected {other:?}"),
    }

    let snap = d.snapshot();
    assert_eq!(snap.summary.unwrap().total, 25);
    assert_eq!(snap.record_count, 25);
    assert!(!snap.stale);
    assert!(snap.updated_at.is_some());
}

#[tokio::test]
async fn test_refresh_while_in_flight_runs_once_more() {
    let (api, gate) = FakeApi::gated();
    let api = Arc::new(api.with_records(roster("B1", 1, 0, 0)));
    let d = dashboard(&api, "B1");

    let first = {
        let d = d.clone();
        tokio::spawn(async move { d.refresh().await })
    };
    wait_for_fetches(&api, 1).await;

    // three more requests while the first fetch is pending
    for _ in 0..3 {
        assert!(matches!(d.refresh().await, RefreshOutcome::Queued));
    }
    assert_eq!(api.fetches(), 1);

    gate.add_permits(1);
    wait_for_fetches(&api, 2).await;
    gate.add_permits(1);

    assert!(matches!(first.await.unwrap(), RefreshOutcome::Updated(_)));
    assert_eq!(api.fetches(), 2);
    assert_eq!(d.fetch_count(), 2);
}

#[tokio::test]
async fn test_response_for_old_filter_is_discarded() {
    let (api, gate) = FakeApi::gated();
    let api = Arc::new(api);
    api.push_fetch(Ok(batch(roster("A", 1, 0, 0))));
    api.push_fetch(Ok(batch(roster("B", 0, 0, 2))));
    let d = dashboard(&api, "A");

    let running = {
        let d = d.clone();
        tokio::spawn(async move { d.refresh().await })
    };
    wait_for_fetches(&api, 1).await;

    d.set_filter(Filter::new("B"));
    assert!(d.summary().is_none());

    gate.add_permits(2);
    let outcome = running.await.unwrap();

    // the last round fetched for B; A's numbers never became visible
    assert!(matches!(outcome, RefreshOutcome::Updated(s) if s.absent == 2));
    let seen: Vec<String> = api
        .seen_filters
        .lock()
        .unwrap()
        .iter()
        .map(|f| f.scope_id.clone())
        .collect();
    assert_eq!(seen, ["A", "B"]);
    assert_eq!(d.filter().scope_id, "B");
    assert_eq!(d.summary().unwrap().total, 2);
}

#[tokio::test]
async fn test_transient_failure_keeps_last_summary() {
    let api = Arc::new(FakeApi::new());
    api.push_fetch(Ok(batch(roster("B1", 3, 0, 1))));
    api.push_fetch(Err(AppError::Transport("connection reset".into())));
    api.push_fetch(Err(AppError::Server {
        status: 503,
        message: "maintenance".into(),
    }));
    let d = dashboard(&api, "B1");

    let good = d.load().await.unwrap();

    assert!(matches!(d.refresh().await, RefreshOutcome::Stale(_)));
    let snap = d.snapshot();
    assert_eq!(snap.summary, Some(good));
    assert!(snap.stale);
    assert_eq!(snap.last_error.as_ref().unwrap().0, ErrorKind::Transport);

    assert!(matches!(d.refresh().await, RefreshOutcome::Stale(_)));
    assert_eq!(d.summary(), Some(good));
    assert_eq!(d.snapshot().last_error.unwrap().0, ErrorKind::Server);

    // recovers on the next success
    assert!(matches!(d.refresh().await, RefreshOutcome::Updated(_)));
    assert!(!d.snapshot().stale);
}

#[tokio::test]
async fn test_auth_failure_is_terminal() {
    let api = Arc::new(FakeApi::new());
    api.push_fetch(Err(AppError::Auth("expired".into())));
    let d = dashboard(&api, "B1");

    let outcome = d.refresh().await;
    assert!(outcome.is_terminal_failure());
    assert_eq!(d.snapshot().last_error.unwrap().0, ErrorKind::Auth);
    assert!(d.load().await.is_ok());
}

#[tokio::test]
async fn test_follow_refreshes_on_signals() {
    let api = Arc::new(FakeApi::new().with_records(vec![rec(
        "1",
        "B1",
        ts(2025, 9, 1, 8),
        "late",
    )]));
    let d = dashboard(&api, "B1");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let signal = SyncSignal {
        scope_id: "B1".into(),
        sources: SignalSources {
            push: true,
            poll: false,
        },
        merged: 1,
    };
    // queued before follow starts: collapsed into a single refresh
    for _ in 0..3 {
        tx.send(signal.clone()).unwrap();
    }
    drop(tx);

    let mut outcomes = Vec::new();
    d.follow(&mut rx, |o, snap| {
        outcomes.push(matches!(o, RefreshOutcome::Updated(_)));
        assert_eq!(snap.summary.unwrap().late, 1);
    })
    .await;

    assert_eq!(outcomes, [true]);
    assert_eq!(api.fetches(), 1);
}

#[tokio::test]
async fn test_fetch_records_batch_is_replaced_not_merged() {
    let api = Arc::new(FakeApi::new());
    api.push_fetch(Ok(batch(roster("B1", 5, 0, 0))));
    api.push_fetch(Ok(RecordBatch::default()));
    let d = dashboard(&api, "B1");

    assert_eq!(d.load().await.unwrap().total, 5);
    assert_eq!(d.load().await.unwrap(), Summary::default());
    assert!(d.included_records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_refresh_does_not_block_later_ones() {
    let (api, gate) = FakeApi::gated();
    let api = Arc::new(api.with_records(roster("B1", 2, 0, 0)));
    let d = dashboard(&api, "B1");

    let cancelled = tokio::time::timeout(Duration::from_millis(50), d.refresh()).await;
    assert!(cancelled.is_err());
    assert_eq!(api.fetches(), 1);

    gate.add_permits(1);
    match d.refresh().await {
        RefreshOutcome::Updated(s) => assert_eq!(s.present, 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(api.fetches(), 2);
}
