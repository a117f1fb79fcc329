// src/export/snapshot.rs

//! Local rendering of what the dashboard currently shows.

use crate::errors::{AppError, AppResult};
use crate::export::fs_utils::{ensure_writable, write_atomically};
use crate::export::model::{RecordRow, headers, row_cells};
use crate::export::pdf::PdfReport;
use crate::export::{ExportFormat, ExportNotice, Notifier};
use crate::models::{DateRange, Filter, RawRecord, Summary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct SnapshotDocument<'a> {
    scope: &'a str,
    range: Option<DateRange>,
    generated_at: DateTime<Utc>,
    summary: &'a Summary,
    records: &'a [RecordRow],
}

/// Render the included records plus their summary in `format`.
pub fn render_snapshot(
    filter: &Filter,
    records: &[RawRecord],
    summary: &Summary,
    format: ExportFormat,
) -> AppResult<Vec<u8>> {
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();

    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(Vec::new());
            if rows.is_empty() {
                wtr.write_record(headers())?;
            }
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.into_inner()
                .map_err(|e| AppError::Export(format!("CSV buffer: {e}")))
        }
        ExportFormat::Json => {
            let doc = SnapshotDocument {
                scope: &filter.scope_id,
                range: filter.date_range,
                generated_at: Utc::now(),
                summary,
                records: &rows,
            };
            Ok(serde_json::to_vec_pretty(&doc)?)
        }
        ExportFormat::Pdf => {
            let title = format!("Attendance: {}", filter.scope_id);
            let range = filter
                .date_range
                .map(|r| r.to_string())
                .unwrap_or_else(|| "all".into());
            let lines = vec![
                ("Range".to_string(), range),
                ("Total".to_string(), summary.total.to_string()),
                ("Present".to_string(), summary.present.to_string()),
                ("Late".to_string(), summary.late.to_string()),
                ("Absent".to_string(), summary.absent.to_string()),
                ("Attendance".to_string(), format!("{}%", summary.percentage)),
            ];
            let table: Vec<Vec<String>> = rows.iter().map(row_cells).collect();
            Ok(PdfReport::new().render(&title, &lines, &headers(), &table))
        }
    }
}

/// Render and write a snapshot to `path`, asking before overwriting unless
/// `force`. Exactly one notice is emitted when rendering or writing was
/// attempted.
pub fn write_snapshot(
    path: &Path,
    force: bool,
    filter: &Filter,
    records: &[RawRecord],
    summary: &Summary,
    format: ExportFormat,
    notifier: &dyn Notifier,
) -> AppResult<()> {
    ensure_writable(path, force)?;

    let result = render_snapshot(filter, records, summary, format)
        .and_then(|bytes| write_atomically(path, &bytes));

    match result {
        Ok(()) => {
            info!(path = %path.display(), records = records.len(), "snapshot written");
            notifier.notify(&ExportNotice::Saved {
                label: format.label().to_string(),
                path: path.to_path_buf(),
            });
            Ok(())
        }
        Err(e) => {
            notifier.notify(&ExportNotice::Failed {
                label: format.label().to_string(),
                kind: e.kind(),
                message: e.to_string(),
            });
            Err(e)
        }
    }
}
