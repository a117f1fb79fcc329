//! Bearer credential handed to us by the hosting platform.

use crate::errors::{AppError, AppResult};
use std::fmt;
use std::fs;
use std::path::Path;

/// Environment variable checked before any configured token.
pub const TOKEN_ENV: &str = "RATTENDANCE_TOKEN";

/// Opaque bearer token. Read-only: nothing in this crate creates,
/// refreshes or inspects it beyond forwarding it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> AppResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AppError::Auth("empty bearer token".into()));
        }
        Ok(Self(token))
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }

    /// Resolve the credential: env var, then token file, then inline token.
    pub fn resolve(inline: Option<&str>, token_file: Option<&Path>) -> AppResult<Self> {
        Self::resolve_from(std::env::var(TOKEN_ENV).ok(), inline, token_file)
    }

    pub fn resolve_from(
        env_value: Option<String>,
        inline: Option<&str>,
        token_file: Option<&Path>,
    ) -> AppResult<Self> {
        if let Some(v) = env_value.filter(|v| !v.trim().is_empty()) {
            return Self::new(v);
        }

        if let Some(path) = token_file
            && path.exists()
        {
            let raw = fs::read_to_string(path).map_err(|e| {
                AppError::Auth(format!("cannot read token file {}: {e}", path.display()))
            })?;
            if !raw.trim().is_empty() {
                return Self::new(raw);
            }
        }

        match inline {
            Some(t) if !t.trim().is_empty() => Self::new(t),
            _ => Err(AppError::Auth(format!(
                "no credential available (set {TOKEN_ENV}, `token_file` or `token`)"
            ))),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
