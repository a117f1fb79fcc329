use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    /// Anything the server sent that is not one of the three above.
    Other(String),
}

impl AttendanceStatus {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "present" => Self::Present,
            "absent" => Self::Absent,
            "late" => Self::Late,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Other(raw) => raw,
        }
    }

    /// Bucket used for the tally: unknown values count as absent.
    pub fn tally_bucket(&self) -> AttendanceStatus {
        match self {
            AttendanceStatus::Other(_) => AttendanceStatus::Absent,
            known => known.clone(),
        }
    }

    /// Total order used to break ties between duplicate records.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            AttendanceStatus::Present => 3,
            AttendanceStatus::Late => 2,
            AttendanceStatus::Absent => 1,
            AttendanceStatus::Other(_) => 0,
        }
    }
}

impl Serialize for AttendanceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One attendance mark as fetched from the server.
///
/// Records are never edited locally: a refresh replaces the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    pub id: String,
    pub scope_id: String,
    pub timestamp: DateTime<Utc>,
    pub subject_label: String,
    pub status: AttendanceStatus,
    pub capture_channel: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
}

impl RawRecord {
    pub fn new(
        id: impl Into<String>,
        scope_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        subject_label: impl Into<String>,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            id: id.into(),
            scope_id: scope_id.into(),
            timestamp,
            subject_label: subject_label.into(),
            status,
            capture_channel: None,
            captured_at: None,
        }
    }

    /// Moment the mark was taken; falls back to the record timestamp.
    pub fn effective_capture(&self) -> DateTime<Utc> {
        self.captured_at.unwrap_or(self.timestamp)
    }

    /// Deterministic "which duplicate wins" ordering (greater wins).
    pub(crate) fn precedence(&self, other: &RawRecord) -> Ordering {
        self.effective_capture()
            .cmp(&other.effective_capture())
            .then_with(|| self.status.rank().cmp(&other.status.rank()))
            .then_with(|| self.subject_label.cmp(&other.subject_label))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.capture_channel.cmp(&other.capture_channel))
            .then_with(|| self.status.as_str().cmp(other.status.as_str()))
    }
}
