pub mod config;
pub mod export;
pub mod init;
pub mod snapshot;
pub mod summary;
pub mod watch;

use crate::api::HttpApi;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{Credential, DateRange, Filter};
use tracing::debug;

/// Filter from `--scope` / `--range`. A missing scope is left empty so the
/// operation itself reports it as a validation error.
pub(crate) fn build_filter(scope: Option<&str>, range: Option<&str>) -> AppResult<Filter> {
    let range = match range {
        Some(r) => DateRange::parse(r)?,
        None => None,
    };
    Ok(Filter::new(scope.unwrap_or_default()).with_range(range))
}

/// Credential if one is configured. Without it every request fails with an
/// auth error before anything is sent.
pub(crate) fn credential(cfg: &Config) -> Option<Credential> {
    let token_file = cfg.token_file_path();
    match Credential::resolve(cfg.token.as_deref(), token_file.as_deref()) {
        Ok(c) => Some(c),
        Err(e) => {
            debug!(error = %e, "no credential");
            None
        }
    }
}

pub(crate) fn http_api(cfg: &Config) -> AppResult<HttpApi> {
    HttpApi::from_config(cfg, credential(cfg))
}
