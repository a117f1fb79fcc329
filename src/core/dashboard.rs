// src/core/dashboard.rs

//! One dashboard view: active filter, last fetched records, derived summary.
//!
//! Refetches are serialized: while one is in flight, further requests only
//! set a rerun flag, and exactly one more fetch follows the current one.
//! Every filter change bumps a generation counter; a response that comes
//! back under an older generation is dropped instead of being aggregated.

use crate::api::{DashboardApi, RecordBatch};
use crate::core::aggregate::{included_records, summarize};
use crate::errors::{AppError, AppResult, ErrorKind};
use crate::models::{Filter, RawRecord, Summary};
use crate::sync::SyncSignal;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What a call to [`Dashboard::refresh`] ended up doing.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// New records were fetched and the summary recomputed.
    Updated(Summary),
    /// A refetch was already running; it will run once more afterwards.
    Queued,
    /// The response belonged to a filter that is no longer active.
    Superseded,
    /// Retryable failure: the previous summary stays on screen.
    Stale(AppError),
    /// Terminal failure (auth, validation): the user has to act.
    Failed(AppError),
}

impl RefreshOutcome {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, RefreshOutcome::Failed(_))
    }
}

/// Read-only copy of what the view currently shows.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub filter: Filter,
    pub summary: Option<Summary>,
    pub stale: bool,
    pub last_error: Option<(ErrorKind, String)>,
    pub updated_at: Option<DateTime<Utc>>,
    pub record_count: usize,
}

struct View {
    filter: Filter,
    generation: u64,
    records: Option<Vec<RawRecord>>,
    summary: Option<Summary>,
    in_flight: bool,
    rerun: bool,
    stale: bool,
    last_error: Option<(ErrorKind, String)>,
    updated_at: Option<DateTime<Utc>>,
    fetches: u64,
}

pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    view: Mutex<View>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn DashboardApi>, filter: Filter) -> Self {
        Self {
            api,
            view: Mutex::new(View {
                filter,
                generation: 0,
                records: None,
                summary: None,
                in_flight: false,
                rerun: false,
                stale: false,
                last_error: None,
                updated_at: None,
                fetches: 0,
            }),
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn filter(&self) -> Filter {
        self.view().filter.clone()
    }

    pub fn summary(&self) -> Option<Summary> {
        self.view().summary
    }

    /// Number of fetches that completed (including discarded ones).
    pub fn fetch_count(&self) -> u64 {
        self.view().fetches
    }

    /// Records of the current set that the active filter includes.
    pub fn included_records(&self) -> Vec<RawRecord> {
        let v = self.view();
        match &v.records {
            Some(records) => included_records(records, &v.filter)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let v = self.view();
        DashboardSnapshot {
            filter: v.filter.clone(),
            summary: v.summary,
            stale: v.stale,
            last_error: v.last_error.clone(),
            updated_at: v.updated_at,
            record_count: v.records.as_ref().map_or(0, Vec::len),
        }
    }

    /// Switch to a new filter. Cached records and summary are dropped; an
    /// in-flight fetch for the old filter will be discarded on arrival and
    /// followed by one fetch for the new filter.
    pub fn set_filter(&self, filter: Filter) {
        let mut v = self.view();
        if v.filter == filter {
            return;
        }
        info!(scope = %filter.scope_id, "filter changed");
        v.generation += 1;
        v.filter = filter;
        v.records = None;
        v.summary = None;
        v.stale = false;
        v.last_error = None;
        v.updated_at = None;
        if v.in_flight {
            v.rerun = true;
        }
    }

    /// Fetch records for the active filter and recompute the summary.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (mut filter, mut generation) = {
            let mut v = self.view();
            if v.in_flight {
                v.rerun = true;
                return RefreshOutcome::Queued;
            }
            v.in_flight = true;
            (v.filter.clone(), v.generation)
        };
        let mut guard = InFlight {
            dashboard: self,
            armed: true,
        };

        loop {
            let result = self.api.fetch_records(&filter).await;

            let (outcome, next) = {
                let mut v = self.view();
                v.fetches += 1;

                let outcome = if v.generation != generation {
                    debug!(scope = %filter.scope_id, "discarding response for superseded filter");
                    RefreshOutcome::Superseded
                } else {
                    apply(&mut v, &filter, result)
                };

                if v.rerun {
                    v.rerun = false;
                    (outcome, Some((v.filter.clone(), v.generation)))
                } else {
                    v.in_flight = false;
                    guard.armed = false;
                    (outcome, None)
                }
            };

            match next {
                Some((f, g)) => {
                    filter = f;
                    generation = g;
                }
                None => return outcome,
            }
        }
    }

    /// Refresh on every signal until the channel closes.
    ///
    /// Signals that pile up while a refresh runs are collapsed into one
    /// follow-up refresh. `on_update` sees every outcome.
    pub async fn follow<F>(&self, signals: &mut mpsc::UnboundedReceiver<SyncSignal>, mut on_update: F)
    where
        F: FnMut(&RefreshOutcome, &DashboardSnapshot),
    {
        while let Some(signal) = signals.recv().await {
            let mut collapsed = 0usize;
            while signals.try_recv().is_ok() {
                collapsed += 1;
            }
            debug!(scope = %signal.scope_id, collapsed, "refreshing on sync signal");

            let outcome = self.refresh().await;
            on_update(&outcome, &self.snapshot());
        }
    }

    /// One-shot convenience: refresh and return the summary or the error.
    pub async fn load(&self) -> AppResult<Summary> {
        match self.refresh().await {
            RefreshOutcome::Updated(s) => Ok(s),
            RefreshOutcome::Stale(e) | RefreshOutcome::Failed(e) => Err(e),
            RefreshOutcome::Queued | RefreshOutcome::Superseded => self
                .summary()
                .ok_or_else(|| AppError::Other("no summary available yet".into())),
        }
    }
}

/// Releases the in-flight slot when a refresh future is dropped before it
/// finished, so later refreshes are not stuck behind it.
struct InFlight<'a> {
    dashboard: &'a Dashboard,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut v = self.dashboard.view();
            v.in_flight = false;
            v.rerun = false;
            debug!(scope = %v.filter.scope_id, "refresh cancelled");
        }
    }
}

fn apply(v: &mut View, filter: &Filter, result: AppResult<RecordBatch>) -> RefreshOutcome {
    match result {
        Ok(batch) => {
            let summary = summarize(&batch.records, filter);

            if let Some(hint) = batch.server_summary
                && hint != summary
            {
                debug!(
                    scope = %filter.scope_id,
                    server_total = hint.total,
                    local_total = summary.total,
                    "server summary differs from records; using local"
                );
            }

            v.records = Some(batch.records);
            v.summary = Some(summary);
            v.stale = false;
            v.last_error = None;
            v.updated_at = Some(Utc::now());
            RefreshOutcome::Updated(summary)
        }
        Err(e) if e.is_retryable() => {
            warn!(scope = %filter.scope_id, error = %e, "refresh failed; keeping last summary");
            v.stale = true;
            v.last_error = Some((e.kind(), e.to_string()));
            RefreshOutcome::Stale(e)
        }
        Err(e) => {
            warn!(scope = %filter.scope_id, error = %e, "refresh failed");
            v.last_error = Some((e.kind(), e.to_string()));
            RefreshOutcome::Failed(e)
        }
    }
}
