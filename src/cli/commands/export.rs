use crate::api::DashboardApi;
use crate::cli::commands::{build_filter, http_api};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::export::{ConsoleNotifier, ExportPipeline, FileSink};
use crate::models::ExportState;
use std::sync::Arc;

/// Handle the `export` command
///
/// The pipeline prints the one success/failure notice itself; a failed job
/// still makes the process exit non-zero.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        scope,
        format,
        range,
        dir,
        force,
    } = cmd
    {
        let filter = build_filter(scope.as_deref(), range.as_deref())?;
        filter.validate()?;

        let dir = dir.clone().unwrap_or_else(|| cfg.export_dir_path());
        let api: Arc<dyn DashboardApi> = Arc::new(http_api(cfg)?);
        let pipeline = ExportPipeline::new(
            api,
            Arc::new(FileSink::new(dir, *force)),
            Arc::new(ConsoleNotifier),
        );

        let job = pipeline
            .request_export(&filter.scope_id, &filter, *format)
            .await?;

        if job.state == ExportState::Failed {
            return Err(AppError::Export(format!(
                "{} export of '{}' failed",
                format.label(),
                job.scope_id
            )));
        }
    }
    Ok(())
}
