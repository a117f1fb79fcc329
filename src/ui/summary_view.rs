//! Text rendering of a dashboard summary.

use crate::core::{DashboardSnapshot, RefreshOutcome};
use crate::models::{Filter, Summary};
use crate::sync::SyncState;
use crate::ui::messages::{detail, warning};
use crate::utils::colors::{color_for_percentage, color_for_staleness, colorize};
use crate::utils::table::{Column, Table};
use crate::utils::time::format_local;

pub fn summary_table(filter: &Filter, summary: &Summary) -> String {
    let mut table = Table::new(vec![
        Column::left("SCOPE", 8),
        Column::left("RANGE", 10),
        Column::right("TOTAL", 5),
        Column::right("PRESENT", 7),
        Column::right("LATE", 4),
        Column::right("ABSENT", 6),
        Column::right("%", 4),
    ]);

    table.add_row(vec![
        filter.scope_id.clone(),
        filter
            .date_range
            .map(|r| r.to_string())
            .unwrap_or_else(|| "all".into()),
        summary.total.to_string(),
        summary.present.to_string(),
        summary.late.to_string(),
        summary.absent.to_string(),
        format!("{}%", summary.percentage),
    ]);

    table.render()
}

/// One-line headline, coloured by attendance rate.
pub fn headline(summary: &Summary, stale: bool) -> String {
    let text = if summary.is_empty() {
        "no attendance records".to_string()
    } else {
        format!(
            "{}% attendance ({} of {} present)",
            summary.percentage, summary.present, summary.total
        )
    };

    let color = if stale {
        color_for_staleness(true)
    } else {
        color_for_percentage(summary.percentage)
    };
    colorize(&text, color)
}

pub fn print_summary(filter: &Filter, summary: &Summary) {
    print!("{}", summary_table(filter, summary));
    println!("{}", headline(summary, false));
}

/// Printed by `watch` after every refresh.
pub fn print_update(outcome: &RefreshOutcome, snap: &DashboardSnapshot, state: SyncState) {
    match outcome {
        RefreshOutcome::Updated(summary) => {
            println!();
            print!("{}", summary_table(&snap.filter, summary));
            println!("{}", headline(summary, false));
            let when = snap.updated_at.map(format_local).unwrap_or_default();
            detail(format!("updated {when} · sync {state}"));
        }
        RefreshOutcome::Stale(e) => {
            if let Some(summary) = &snap.summary {
                println!("{}", headline(summary, true));
            }
            warning(format!("showing last known numbers: {e}"));
        }
        RefreshOutcome::Failed(e) => warning(format!("refresh failed: {e}")),
        RefreshOutcome::Queued | RefreshOutcome::Superseded => {}
    }
}
