// src/export/model.rs

use crate::models::RawRecord;
use crate::utils::time::format_local;
use serde::Serialize;

/// Struttura “piatta” di un record per CSV / PDF.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub date: String,
    pub time: String,
    pub subject: String,
    pub status: String,
    pub channel: String,
    pub captured_at: String,
}

impl From<&RawRecord> for RecordRow {
    fn from(r: &RawRecord) -> Self {
        Self {
            id: r.id.clone(),
            date: r.timestamp.format("%Y-%m-%d").to_string(),
            time: r.timestamp.format("%H:%M:%S").to_string(),
            subject: r.subject_label.clone(),
            status: r.status.as_str().to_string(),
            channel: r.capture_channel.clone().unwrap_or_default(),
            captured_at: r.captured_at.map(format_local).unwrap_or_default(),
        }
    }
}

/// Header per CSV / PDF
pub(crate) fn headers() -> [&'static str; 7] {
    [
        "id",
        "date",
        "time",
        "subject",
        "status",
        "channel",
        "captured_at",
    ]
}

pub(crate) fn row_cells(r: &RecordRow) -> Vec<String> {
    vec![
        r.id.clone(),
        r.date.clone(),
        r.time.clone(),
        r.subject.clone(),
        r.status.clone(),
        r.channel.clone(),
        r.captured_at.clone(),
    ]
}
