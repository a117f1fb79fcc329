use crate::cli::commands::{build_filter, http_api};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::Dashboard;
use crate::errors::AppResult;
use crate::ui::summary_view::print_summary;
use std::sync::Arc;

/// Handle the `summary` command: one fetch, one table.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Summary { scope, range } = cmd {
        let filter = build_filter(scope.as_deref(), range.as_deref())?;
        filter.validate()?;

        let dashboard = Dashboard::new(Arc::new(http_api(cfg)?), filter.clone());
        let summary = dashboard.load().await?;

        print_summary(&filter, &summary);
    }
    Ok(())
}
