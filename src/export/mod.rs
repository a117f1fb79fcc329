// src/export/mod.rs

mod fs_utils;
pub mod filename;
mod model;
mod pdf;
pub mod pipeline;
pub mod sink;
pub mod snapshot;

pub use fs_utils::{ensure_writable, write_atomically};
pub use model::RecordRow;
pub use pipeline::ExportPipeline;
pub use sink::{ArtifactHandle, ArtifactSink, FileSink};

use crate::errors::ErrorKind;
use crate::ui::messages::{error, success};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Helper comune per messaggi di completamento export.
pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Json => "JSON",
        }
    }
}

/// One-shot, user-visible outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotice {
    Saved {
        label: String,
        path: PathBuf,
    },
    Failed {
        label: String,
        kind: ErrorKind,
        message: String,
    },
}

/// Where export notices go (console, test recorder, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &ExportNotice);
}

/// Prints notices with the coloured `ui::messages` helpers.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &ExportNotice) {
        match notice {
            ExportNotice::Saved { label, path } => notify_export_success(label, path),
            ExportNotice::Failed {
                label,
                kind: ErrorKind::Auth,
                message,
            } => error(format!(
                "{label} export failed: {message} (re-authentication required)"
            )),
            ExportNotice::Failed { label, message, .. } => {
                error(format!("{label} export failed: {message}"))
            }
        }
    }
}
