//! Unified application error type.
//! All modules (api, sync, core, export, cli) return AppError to keep the
//! error handling consistent. Every variant maps onto one ErrorKind, which
//! is what callers use to decide between "retry later" and "tell the user".

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Network / server boundary
    // ---------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected server payload: {0}")]
    Protocol(String),

    #[error("Authentication required: {0}")]
    Auth(String),

    // ---------------------------
    // Input validation
    // ---------------------------
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Serialization / rendering
    // ---------------------------
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

/// Coarse classification used by the sync loop, the dashboard and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure; the next poll will likely fix it.
    Transport,
    /// Bad local input; nothing was sent.
    Validation,
    /// Non-success response (or a payload we could not understand).
    Server,
    /// Missing or rejected credential; the user must re-authenticate.
    Auth,
    /// Local failure (disk, config, rendering).
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Validation => "validation",
            ErrorKind::Server => "server",
            ErrorKind::Auth => "auth",
            ErrorKind::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Transport(_) => ErrorKind::Transport,
            AppError::Server { .. } | AppError::Protocol(_) => ErrorKind::Server,
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::Validation(_) | AppError::InvalidDate(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// True for failures that a later attempt (next poll, user retry) can
    /// fix without any change on the user's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Server)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return match status.as_u16() {
                401 | 403 => AppError::Auth(format!("server rejected credential ({status})")),
                code => AppError::Server {
                    status: code,
                    message: e.to_string(),
                },
            };
        }

        if e.is_decode() {
            return AppError::Protocol(e.to_string());
        }

        AppError::Transport(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
