use crate::api::DashboardApi;
use crate::cli::commands::{build_filter, credential, http_api};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::{Dashboard, RefreshOutcome};
use crate::errors::{AppError, AppResult};
use crate::sync::{SsePushChannel, SyncCoordinator, SyncSettings};
use crate::ui::messages::{info, warning};
use crate::ui::summary_view::print_update;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Handle the `watch` command
///
/// Loads the summary once, then opens a sync session and refreshes on every
/// coalesced signal until Ctrl-C.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Watch { scope, range } = cmd else {
        return Ok(());
    };

    let filter = build_filter(scope.as_deref(), range.as_deref())?;
    filter.validate()?;

    let api: Arc<dyn DashboardApi> = Arc::new(http_api(cfg)?);
    let dashboard = Dashboard::new(api, filter.clone());

    let first = match dashboard.refresh().await {
        RefreshOutcome::Failed(e) => return Err(e),
        other => other,
    };

    let credential = credential(cfg)
        .ok_or_else(|| AppError::Auth("no credential available for live updates".into()))?;

    let push = SsePushChannel::new(
        &cfg.server_url,
        Duration::from_secs(cfg.request_timeout_secs),
    )?;
    let coordinator = SyncCoordinator::new(Arc::new(push), SyncSettings::from_config(cfg));
    let handle = coordinator.open(&filter.scope_id, credential)?;

    print_update(&first, &dashboard.snapshot(), handle.state());
    info(format!(
        "Watching '{}' (poll every {}s). Press Ctrl-C to stop.",
        filter.scope_id, cfg.poll_interval_secs
    ));

    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.on_signal(move |signal| {
        let _ = tx.send(signal.clone());
    });

    let mut warned_escalation = false;
    let result = tokio::select! {
        _ = dashboard.follow(&mut rx, |outcome, snap| {
            print_update(outcome, snap, handle.state());
            if handle.push_escalated() && !warned_escalation {
                warned_escalation = true;
                if handle.push_auth_rejected() {
                    warning("Live updates refused by the server; continuing with polling only.");
                } else {
                    warning("Live updates keep failing; numbers refresh on the poll interval.");
                }
            }
        }) => Ok(()),
        r = tokio::signal::ctrl_c() => r.map_err(AppError::from),
    };

    coordinator.close(&handle);
    info("Stopped.");
    result
}
