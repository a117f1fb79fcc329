use crate::cli::commands::{build_filter, http_api};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::Dashboard;
use crate::errors::AppResult;
use crate::export::ConsoleNotifier;
use crate::export::snapshot::write_snapshot;
use std::sync::Arc;

/// Handle the `snapshot` command: fetch, then render locally.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Snapshot {
        scope,
        format,
        file,
        range,
        force,
    } = cmd
    {
        let filter = build_filter(scope.as_deref(), range.as_deref())?;
        filter.validate()?;

        let dashboard = Dashboard::new(Arc::new(http_api(cfg)?), filter.clone());
        let summary = dashboard.load().await?;
        let records = dashboard.included_records();

        write_snapshot(
            file,
            *force,
            &filter,
            &records,
            &summary,
            *format,
            &ConsoleNotifier,
        )?;
    }
    Ok(())
}
