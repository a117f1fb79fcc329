#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures_util::stream::{self, StreamExt};
use rattendance::api::{ArtifactResponse, DashboardApi, RecordBatch};
use rattendance::errors::{AppError, AppResult};
use rattendance::export::{ExportFormat, ExportNotice, Notifier};
use rattendance::models::{AttendanceStatus, Credential, Filter, RawRecord};
use rattendance::sync::{PushChannel, PushMessage, PushStream};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, mpsc};

pub fn rta() -> Command {
    let mut cmd = cargo_bin_cmd!("rattendance");
    cmd.env_remove("RATTENDANCE_TOKEN").env("NO_COLOR", "1");
    cmd
}

/// Write a config file pointing at `server` into `dir` and return its path.
pub fn write_config(dir: &Path, server: &str, token: Option<&str>) -> String {
    let path = dir.join("rattendance.conf");
    let mut yaml = format!("server_url: {server}\nexport_dir: {}\n", dir.display());
    if let Some(t) = token {
        yaml.push_str(&format!("token: {t}\n"));
    }
    std::fs::write(&path, yaml).unwrap();
    path.to_string_lossy().to_string()
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn rec(id: &str, scope: &str, at: DateTime<Utc>, status: &str) -> RawRecord {
    RawRecord::new(
        id,
        scope,
        at,
        format!("student {id}"),
        AttendanceStatus::from_wire(status),
    )
}

/// `present` present, `late` late, `absent` absent marks for `scope`, one
/// hour apart starting at 2025-09-01 08:00.
pub fn roster(scope: &str, present: usize, late: usize, absent: usize) -> Vec<RawRecord> {
    let statuses = std::iter::repeat_n("present", present)
        .chain(std::iter::repeat_n("late", late))
        .chain(std::iter::repeat_n("absent", absent));

    statuses
        .enumerate()
        .map(|(i, s)| {
            let at = ts(2025, 9, 1, 8) + chrono::Duration::hours(i as i64);
            rec(&format!("{scope}-{i}"), scope, at, s)
        })
        .collect()
}

pub fn batch(records: Vec<RawRecord>) -> RecordBatch {
    RecordBatch {
        records,
        server_summary: None,
        rejected: 0,
    }
}

// ---------------------------------------------------------------------------
// Fake server boundary
// ---------------------------------------------------------------------------

/// Scripted `DashboardApi`.
///
/// Queued results are returned in order; once the queue is empty fetches
/// return `default_records`. With `gated()` every call waits for a permit.
#[derive(Default)]
pub struct FakeApi {
    pub fetch_calls: AtomicUsize,
    pub export_calls: AtomicUsize,
    pub seen_filters: Mutex<Vec<Filter>>,
    fetches: Mutex<VecDeque<AppResult<RecordBatch>>>,
    exports: Mutex<VecDeque<AppResult<ArtifactResponse>>>,
    default_records: Mutex<Vec<RawRecord>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Some(gate.clone()),
                ..Self::default()
            },
            gate,
        )
    }

    pub fn with_records(self, records: Vec<RawRecord>) -> Self {
        *self.default_records.lock().unwrap() = records;
        self
    }

    pub fn push_fetch(&self, result: AppResult<RecordBatch>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    pub fn push_export(&self, result: AppResult<ArtifactResponse>) {
        self.exports.lock().unwrap().push_back(result);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn exports(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn fetch_records(&self, filter: &Filter) -> AppResult<RecordBatch> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filter.clone());
        self.wait_gate().await;

        let queued = self.fetches.lock().unwrap().pop_front();
        match queued {
            Some(r) => r,
            None => Ok(batch(self.default_records.lock().unwrap().clone())),
        }
    }

    async fn request_export(
        &self,
        filter: &Filter,
        _format: ExportFormat,
    ) -> AppResult<ArtifactResponse> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filter.clone());
        self.wait_gate().await;

        let queued = self.exports.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(ArtifactResponse {
                bytes: b"id,status\n1,present\n".to_vec(),
                ..ArtifactResponse::default()
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Fake push transport
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushMode {
    /// Every connect fails with a transport error.
    Unreachable,
    /// Every connect fails with an auth error.
    RejectAuth,
    /// Connect succeeds; messages are fed through `FakePush::send`.
    Live,
}

pub struct FakePush {
    mode: PushMode,
    pub connects: AtomicUsize,
    senders: Mutex<Vec<mpsc::UnboundedSender<AppResult<PushMessage>>>>,
}

impl FakePush {
    pub fn new(mode: PushMode) -> Self {
        Self {
            mode,
            connects: AtomicUsize::new(0),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Deliver `data` on the most recent connection.
    pub fn send(&self, data: &str) {
        self.send_event(None, data);
    }

    pub fn send_event(&self, event: Option<&str>, data: &str) {
        let senders = self.senders.lock().unwrap();
        if let Some(tx) = senders.last() {
            let _ = tx.send(Ok(PushMessage {
                event: event.map(str::to_string),
                data: data.to_string(),
            }));
        }
    }

    /// Drop the most recent connection.
    pub fn drop_connection(&self) {
        self.senders.lock().unwrap().pop();
    }
}

#[async_trait]
impl PushChannel for FakePush {
    async fn connect(&self, _scope_id: &str, _credential: &Credential) -> AppResult<PushStream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            PushMode::Unreachable => Err(AppError::Transport("connection refused".into())),
            PushMode::RejectAuth => Err(AppError::Auth("token rejected".into())),
            PushMode::Live => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.senders.lock().unwrap().push(tx);
                Ok(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|m| (m, rx))
                })
                .boxed())
            }
        }
    }
}

pub fn token() -> Credential {
    Credential::new("test-token").unwrap()
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<ExportNotice>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<ExportNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &ExportNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// ---------------------------------------------------------------------------
// In-process HTTP server
// ---------------------------------------------------------------------------

/// Serve `app` on an ephemeral port of the current runtime; returns the base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Same as [`serve`], on a dedicated thread, for blocking CLI tests.
pub fn serve_in_background(app: axum::Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}
