// src/export/pipeline.rs

//! User-initiated export of a server-rendered artifact.

use crate::api::DashboardApi;
use crate::errors::{AppError, AppResult};
use crate::export::filename::resolve_file_name;
use crate::export::sink::{ArtifactHandle, ArtifactSink};
use crate::export::{ExportFormat, ExportNotice, Notifier};
use crate::models::{ExportJob, Filter};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub struct ExportPipeline {
    api: Arc<dyn DashboardApi>,
    sink: Arc<dyn ArtifactSink>,
    notifier: Arc<dyn Notifier>,
    busy: AtomicBool,
}

/// Clears the busy flag however the export ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExportPipeline {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        sink: Arc<dyn ArtifactSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            sink,
            notifier,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Request, name and persist one artifact.
    ///
    /// Invalid input and a concurrent export are rejected with
    /// `AppError::Validation` before anything is sent. Once the request is
    /// issued the result is always a terminal [`ExportJob`]: server,
    /// transport and write failures end up in `job.failure`, never retried.
    pub async fn request_export(
        &self,
        scope_id: &str,
        filter: &Filter,
        format: ExportFormat,
    ) -> AppResult<ExportJob> {
        let filter = Filter {
            scope_id: scope_id.trim().to_string(),
            ..filter.clone()
        }
        .with_format(format);
        filter.validate()?;

        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(AppError::validation("export already in progress"));
        }
        let _busy = BusyGuard(&self.busy);

        let job = ExportJob::pending(filter.clone(), format);
        info!(scope = %job.scope_id, format = format.as_str(), "export requested");

        let response = match self.api.request_export(&filter, format).await {
            Ok(r) => r,
            Err(e) => return Ok(self.failed(job, e)),
        };

        let name = resolve_file_name(
            response.content_disposition.as_deref(),
            &job.scope_id,
            format,
            Utc::now(),
        );
        let artifact = ArtifactHandle::new(response.bytes, name.clone());
        let saved = self.sink.persist(&artifact);
        drop(artifact);

        match saved {
            Ok(path) => {
                info!(scope = %job.scope_id, path = %path.display(), "export saved");
                self.notifier.notify(&ExportNotice::Saved {
                    label: format.label().to_string(),
                    path: path.clone(),
                });
                Ok(job.succeed(name, path))
            }
            Err(e) => Ok(self.failed(job, e)),
        }
    }

    fn failed(&self, job: ExportJob, err: AppError) -> ExportJob {
        warn!(scope = %job.scope_id, kind = err.kind().as_str(), error = %err, "export failed");
        self.notifier.notify(&ExportNotice::Failed {
            label: job.format.label().to_string(),
            kind: err.kind(),
            message: err.to_string(),
        });
        job.fail(&err)
    }
}
