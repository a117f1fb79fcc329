// src/api/wire.rs

//! Server payload shapes and their validation into strict model types.
//!
//! The server is loosely typed (ids may be numbers, field names vary
//! between camelCase and snake_case, summaries are optional). Everything is
//! checked here once; the rest of the crate only sees `RawRecord` and
//! `Summary`.

use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceStatus, RawRecord, Summary};
use crate::utils::time::parse_timestamp;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Result of one record fetch after validation.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<RawRecord>,
    /// Summary the server computed, if it sent a self-consistent one.
    pub server_summary: Option<Summary>,
    /// Records dropped because they did not validate.
    pub rejected: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsPayload {
    Envelope {
        records: Vec<Value>,
        #[serde(default)]
        summary: Option<Value>,
    },
    Bare(Vec<Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl WireId {
    fn into_string(self) -> Option<String> {
        match self {
            WireId::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            WireId::Text(_) => None,
            WireId::Signed(n) => Some(n.to_string()),
            WireId::Unsigned(n) => Some(n.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    id: WireId,
    #[serde(default, alias = "scope", alias = "scope_id", alias = "batchId", alias = "batch_id")]
    scope_id: Option<Value>,
    #[serde(alias = "date", alias = "createdAt", alias = "created_at")]
    timestamp: String,
    #[serde(
        default,
        alias = "subject_label",
        alias = "subject",
        alias = "studentName",
        alias = "student_name"
    )]
    subject_label: Option<String>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default, alias = "capture_channel", alias = "method")]
    capture_channel: Option<String>,
    #[serde(default, alias = "captured_at", alias = "markedAt")]
    captured_at: Option<String>,
}

#[derive(Deserialize)]
struct WireSummary {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    present: u64,
    #[serde(default)]
    absent: u64,
    #[serde(default)]
    late: u64,
    #[serde(default)]
    percentage: Option<f64>,
}

impl WireRecord {
    fn validate(self, requested_scope: &str) -> AppResult<RawRecord> {
        let id = self
            .id
            .into_string()
            .ok_or_else(|| AppError::Protocol("record with empty id".into()))?;

        let timestamp = parse_timestamp(&self.timestamp)
            .ok_or_else(|| AppError::Protocol(format!("record {id}: bad timestamp")))?;

        let captured_at = match self.captured_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_timestamp(raw)
                    .ok_or_else(|| AppError::Protocol(format!("record {id}: bad capturedAt")))?,
            ),
        };

        let scope_id = scalar_text(self.scope_id)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| requested_scope.to_string());

        Ok(RawRecord {
            id,
            scope_id,
            timestamp,
            subject_label: self.subject_label.unwrap_or_default().trim().to_string(),
            status: status_from_wire(self.status),
            capture_channel: self
                .capture_channel
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            captured_at,
        })
    }
}

/// Strings and numbers as trimmed text; anything else is absent.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A missing or malformed status is still a mark: it lands in `Other` and
/// is tallied as absent instead of dropping the record.
fn status_from_wire(value: Option<Value>) -> AttendanceStatus {
    match value {
        Some(Value::String(s)) => AttendanceStatus::from_wire(&s),
        None | Some(Value::Null) => AttendanceStatus::Other("unknown".into()),
        Some(other) => AttendanceStatus::Other(other.to_string()),
    }
}

impl WireSummary {
    /// `None` when the numbers do not add up.
    fn validate(self) -> Option<Summary> {
        let s = Summary::from_counts(self.present, self.absent, self.late);
        if let Some(total) = self.total
            && total != s.total
        {
            return None;
        }
        if let Some(p) = self.percentage
            && (p.round() as i64) != i64::from(s.percentage)
        {
            return None;
        }
        Some(s)
    }
}

/// Parse a records response body.
///
/// Accepts `{ "records": [...], "summary": {...}? }` or a bare array.
/// Invalid individual records are dropped and counted in `rejected`.
pub fn parse_records(body: &[u8], requested_scope: &str) -> AppResult<RecordBatch> {
    let payload: RecordsPayload = serde_json::from_slice(body)
        .map_err(|e| AppError::Protocol(format!("records payload: {e}")))?;

    let (raw_records, raw_summary) = match payload {
        RecordsPayload::Envelope { records, summary } => (records, summary),
        RecordsPayload::Bare(records) => (records, None),
    };

    let mut batch = RecordBatch::default();

    for value in raw_records {
        let parsed = serde_json::from_value::<WireRecord>(value)
            .map_err(|e| AppError::Protocol(e.to_string()))
            .and_then(|w| w.validate(requested_scope));

        match parsed {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                debug!(error = %e, "dropping invalid record");
                batch.rejected += 1;
            }
        }
    }

    if batch.rejected > 0 {
        warn!(
            rejected = batch.rejected,
            accepted = batch.records.len(),
            scope = requested_scope,
            "server sent records that failed validation"
        );
    }

    batch.server_summary = raw_summary
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value::<WireSummary>(v).ok())
        .and_then(WireSummary::validate);

    Ok(batch)
}

/// Pull a human-readable message out of an error body.
pub fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(Value::String(s)) = map.get(key) {
                return Some(s.clone());
            }
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(200).collect())
    }
}

/// Scope named in a push message body, if any.
///
/// Push messages are opaque triggers; we only look for a scope so that
/// events for other scopes can be ignored.
pub fn push_message_scope(data: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(data) else {
        return None;
    };
    ["scope", "scopeId", "scope_id", "batchId", "batch_id"]
        .into_iter()
        .find_map(|key| scalar_text(map.get(key).cloned()))
}
