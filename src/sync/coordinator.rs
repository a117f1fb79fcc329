// src/sync/coordinator.rs

//! Live-update session per dashboard view.
//!
//! One `open` spawns three cooperating tasks:
//!
//! ```text
//! push task ──Trigger::Push──┐
//!                            ├──> coalescer ──SyncSignal──> handlers
//! poll task ──Trigger::Poll──┘
//! ```
//!
//! The poll task fires every `poll_interval` whatever the push side is
//! doing, so staleness stays bounded even with no push channel at all.
//! The coalescer turns every burst of triggers inside one window into a
//! single signal.

use crate::api::wire::push_message_scope;
use crate::config::Config;
use crate::errors::{AppError, AppResult, ErrorKind};
use crate::models::Credential;
use crate::sync::backoff::Backoff;
use crate::sync::push::{PushChannel, PushMessage};
use crate::sync::state::{SignalSources, SyncSignal, SyncState, Trigger};
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until, timeout};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub coalesce_window: Duration,
    pub backoff: Backoff,
    /// Consecutive failed reconnects before the failure is escalated.
    pub max_reconnect_attempts: u32,
    /// Treat a silent push connection as dropped after this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            coalesce_window: Duration::from_millis(500),
            backoff: Backoff::default(),
            max_reconnect_attempts: 5,
            idle_timeout: Some(Duration::from_secs(90)),
        }
    }
}

impl SyncSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            coalesce_window: Duration::from_millis(cfg.coalesce_window_ms),
            backoff: Backoff::new(
                Duration::from_millis(cfg.reconnect_initial_ms),
                Duration::from_millis(cfg.reconnect_max_ms),
            ),
            max_reconnect_attempts: cfg.max_reconnect_attempts,
            idle_timeout: match cfg.push_idle_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

type SignalHandler = Arc<dyn Fn(&SyncSignal) + Send + Sync>;

struct Listeners {
    closed: bool,
    handlers: Vec<SignalHandler>,
}

/// State shared between the handle and its tasks.
struct Shared {
    scope_id: String,
    listeners: Mutex<Listeners>,
    state: watch::Sender<SyncState>,
    push_escalated: AtomicBool,
    push_auth_rejected: AtomicBool,
    delivered: AtomicU64,
}

impl Shared {
    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SyncState) {
        self.state.send_if_modified(|cur| {
            if *cur == SyncState::Closed || *cur == next {
                return false;
            }
            debug!(scope = %self.scope_id, from = %cur, to = %next, "sync state");
            *cur = next;
            true
        });
    }

    /// Invoke every handler, unless the session is closed.
    ///
    /// Handlers run under the listener lock, which `close` also takes, so
    /// once `close` returns no handler can be running or start running.
    fn deliver(&self, signal: &SyncSignal) -> bool {
        let guard = self.listeners();
        if guard.closed {
            return false;
        }
        for handler in &guard.handlers {
            handler(signal);
        }
        self.delivered.fetch_add(1, Ordering::Relaxed);
        true
    }
}

/// Owner side of an open session. Dropping it closes the session.
pub struct SubscriptionHandle {
    shared: Arc<Shared>,
    state_rx: watch::Receiver<SyncState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriptionHandle {
    pub fn scope_id(&self) -> &str {
        &self.shared.scope_id
    }

    /// Register a callback for coalesced signals.
    ///
    /// Handlers must be quick and must not call `close` on this handle.
    pub fn on_signal<F>(&self, handler: F)
    where
        F: Fn(&SyncSignal) + Send + Sync + 'static,
    {
        let mut guard = self.shared.listeners();
        if !guard.closed {
            guard.handlers.push(Arc::new(handler));
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state_rx.borrow()
    }

    /// Wait until the session reaches a state matching `pred`.
    pub async fn wait_for_state<P>(&self, mut pred: P) -> SyncState
    where
        P: FnMut(&SyncState) -> bool,
    {
        let mut rx = self.state_rx.clone();
        match rx.wait_for(|s| pred(s)).await {
            Ok(s) => *s,
            Err(_) => self.state(),
        }
    }

    /// Reconnection kept failing (or the credential was refused).
    pub fn push_escalated(&self) -> bool {
        self.shared.push_escalated.load(Ordering::Relaxed)
    }

    pub fn push_auth_rejected(&self) -> bool {
        self.shared.push_auth_rejected.load(Ordering::Relaxed)
    }

    pub fn signals_delivered(&self) -> u64 {
        self.shared.delivered.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.listeners().closed
    }

    /// Tear down push session and fallback timer. Idempotent.
    pub fn close(&self) {
        {
            let mut guard = self.shared.listeners();
            if guard.closed {
                return;
            }
            guard.closed = true;
            guard.handlers.clear();
        }

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            task.abort();
        }

        self.shared.state.send_replace(SyncState::Closed);
        info!(scope = %self.shared.scope_id, "sync session closed");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens live-update sessions over a given push transport.
pub struct SyncCoordinator {
    push: Arc<dyn PushChannel>,
    settings: SyncSettings,
}

impl SyncCoordinator {
    pub fn new(push: Arc<dyn PushChannel>, settings: SyncSettings) -> Self {
        Self { push, settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Start a session for `scope_id`.
    ///
    /// Never fails because of the push channel: if it cannot be reached
    /// the session runs on the fallback poll alone. Must be called from
    /// within a tokio runtime.
    pub fn open(
        &self,
        scope_id: impl Into<String>,
        credential: Credential,
    ) -> AppResult<SubscriptionHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| AppError::Other("sync coordinator needs a tokio runtime".into()))?;

        let scope_id = scope_id.into().trim().to_string();
        if scope_id.is_empty() {
            return Err(AppError::validation("no scope selected"));
        }

        let (state_tx, state_rx) = watch::channel(SyncState::Disconnected);
        let shared = Arc::new(Shared {
            scope_id: scope_id.clone(),
            listeners: Mutex::new(Listeners {
                closed: false,
                handlers: Vec::new(),
            }),
            state: state_tx,
            push_escalated: AtomicBool::new(false),
            push_auth_rejected: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
        });

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

        let coalescer = runtime.spawn(run_coalescer(
            shared.clone(),
            trigger_rx,
            self.settings.coalesce_window,
        ));
        let poller = runtime.spawn(run_poll_timer(
            trigger_tx.clone(),
            self.settings.poll_interval,
            self.settings.coalesce_window,
        ));
        let pusher = runtime.spawn(run_push(
            shared.clone(),
            self.push.clone(),
            credential,
            self.settings.clone(),
            trigger_tx,
        ));

        info!(
            scope = %scope_id,
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            coalesce_window_ms = self.settings.coalesce_window.as_millis() as u64,
            "sync session opened"
        );

        Ok(SubscriptionHandle {
            shared,
            state_rx,
            tasks: Mutex::new(vec![pusher, poller, coalescer]),
        })
    }

    pub fn close(&self, handle: &SubscriptionHandle) {
        handle.close();
    }
}

/// Ticks run one coalescing window early so the signal a tick opens is
/// delivered on the interval boundary, not a window after it.
async fn run_poll_timer(tx: mpsc::UnboundedSender<Trigger>, period: Duration, window: Duration) {
    let period = period.max(Duration::from_millis(1));
    let first = Instant::now() + period.saturating_sub(window);
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        trace!("fallback poll tick");
        if tx.send(Trigger::Poll).is_err() {
            break;
        }
    }
}

async fn run_coalescer(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<Trigger>,
    window: Duration,
) {
    while let Some(first) = rx.recv().await {
        let mut sources = SignalSources::default();
        sources.add(first);
        let mut merged = 1;

        let deadline = Instant::now() + window;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                next = rx.recv() => match next {
                    Some(t) => {
                        sources.add(t);
                        merged += 1;
                    }
                    None => break,
                },
            }
        }

        let signal = SyncSignal {
            scope_id: shared.scope_id.clone(),
            sources,
            merged,
        };
        debug!(
            scope = %signal.scope_id,
            merged,
            push = sources.push,
            poll = sources.poll,
            "sync signal"
        );

        if !shared.deliver(&signal) {
            break;
        }
    }
}

fn is_relevant(msg: &PushMessage, scope_id: &str) -> bool {
    if msg.is_heartbeat() {
        return false;
    }
    match push_message_scope(&msg.data) {
        Some(other) => other == scope_id,
        None => true,
    }
}

async fn run_push(
    shared: Arc<Shared>,
    push: Arc<dyn PushChannel>,
    credential: Credential,
    settings: SyncSettings,
    tx: mpsc::UnboundedSender<Trigger>,
) {
    let scope = shared.scope_id.clone();
    let mut failures: u32 = 0;
    let mut ever_connected = false;

    loop {
        shared.set_state(if ever_connected || failures > 0 {
            SyncState::Reconnecting
        } else {
            SyncState::Connecting
        });

        match push.connect(&scope, &credential).await {
            Ok(mut stream) => {
                failures = 0;
                ever_connected = true;
                shared.push_escalated.store(false, Ordering::Relaxed);
                shared.set_state(SyncState::Connected);
                info!(scope = %scope, "push channel connected");

                loop {
                    let next = match settings.idle_timeout {
                        Some(idle) => match timeout(idle, stream.next()).await {
                            Ok(next) => next,
                            Err(_) => {
                                warn!(scope = %scope, "push channel idle, reconnecting");
                                break;
                            }
                        },
                        None => stream.next().await,
                    };

                    match next {
                        Some(Ok(msg)) if is_relevant(&msg, &scope) => {
                            if tx.send(Trigger::Push).is_err() {
                                return;
                            }
                        }
                        Some(Ok(msg)) => {
                            trace!(scope = %scope, event = ?msg.event, "ignoring push message");
                        }
                        Some(Err(e)) => {
                            warn!(scope = %scope, error = %e, "push channel dropped");
                            break;
                        }
                        None => {
                            info!(scope = %scope, "push stream ended");
                            break;
                        }
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Auth => {
                warn!(
                    scope = %scope,
                    error = %e,
                    "push channel refused the credential; staying on polling"
                );
                shared.push_auth_rejected.store(true, Ordering::Relaxed);
                shared.push_escalated.store(true, Ordering::Relaxed);
                shared.set_state(SyncState::Degraded);
                return;
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if failures == 1 && !ever_connected {
                    info!(scope = %scope, error = %e, "push channel unavailable, polling only");
                } else {
                    debug!(scope = %scope, error = %e, failures, "push reconnect failed");
                }
                if failures == settings.max_reconnect_attempts {
                    warn!(
                        scope = %scope,
                        failures,
                        "push channel keeps failing; data refreshes every poll interval"
                    );
                    shared.push_escalated.store(true, Ordering::Relaxed);
                }
            }
        }

        shared.set_state(SyncState::Reconnecting);
        sleep(settings.backoff.delay(failures.saturating_sub(1))).await;
    }
}
