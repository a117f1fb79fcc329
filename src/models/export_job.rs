use crate::errors::{AppError, ErrorKind};
use crate::export::ExportFormat;
use crate::models::filter::Filter;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AppError> for ExportFailure {
    fn from(e: &AppError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// One user-initiated export. Terminal once it leaves `Pending`.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub scope_id: String,
    pub filter: Filter,
    pub format: ExportFormat,
    pub state: ExportState,
    pub file_name: Option<String>,
    pub saved_to: Option<PathBuf>,
    pub failure: Option<ExportFailure>,
}

impl ExportJob {
    pub fn pending(filter: Filter, format: ExportFormat) -> Self {
        Self {
            scope_id: filter.scope_id.clone(),
            filter,
            format,
            state: ExportState::Pending,
            file_name: None,
            saved_to: None,
            failure: None,
        }
    }

    pub fn succeed(mut self, file_name: String, saved_to: PathBuf) -> Self {
        self.state = ExportState::Succeeded;
        self.file_name = Some(file_name);
        self.saved_to = Some(saved_to);
        self
    }

    pub fn fail(mut self, err: &AppError) -> Self {
        self.state = ExportState::Failed;
        self.failure = Some(ExportFailure::from(err));
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state != ExportState::Pending
    }
}
