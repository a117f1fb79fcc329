// src/export/filename.rs

//! Suggested file name of a server artifact.
//!
//! The name comes from `Content-Disposition` when the server sends a usable
//! one, otherwise from `attendance_<scope>_<stamp>.<ext>`. Either way the
//! result is a single, non-empty path component.

use crate::export::ExportFormat;
use crate::utils::time::file_stamp;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static FILENAME_EXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\*\s*=\s*([A-Za-z0-9_-]*)'[^']*'([^;\s]+)"#)
        .expect("static regex")
});

static FILENAME_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*"((?:[^"\\]|\\.)*)""#).expect("static regex")
});

static FILENAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*([^;"\s]+)"#).expect("static regex")
});

const MAX_NAME_LEN: usize = 200;

/// Extract a safe file name from a `Content-Disposition` value.
///
/// `filename*=` (RFC 5987) wins over `filename=`. Returns `None` when the
/// header has no name or the name is unusable.
pub fn from_content_disposition(header: &str) -> Option<String> {
    if let Some(c) = FILENAME_EXT.captures(header)
        && let Some(decoded) = percent_decode(&c[2])
        && let Some(name) = sanitize_file_name(&decoded)
    {
        return Some(name);
    }

    if let Some(c) = FILENAME_QUOTED.captures(header) {
        let unescaped = c[1].replace("\\\"", "\"").replace("\\\\", "\\");
        return sanitize_file_name(&unescaped);
    }

    FILENAME_TOKEN
        .captures(header)
        .and_then(|c| sanitize_file_name(&c[1]))
}

/// Keep only the last path component; reject empty, dot-only, hidden,
/// over-long names and names with control characters.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();

    if last.is_empty()
        || last.starts_with('.')
        || last.len() > MAX_NAME_LEN
        || last.chars().any(|c| c.is_control())
    {
        return None;
    }

    Some(last.to_string())
}

/// `attendance_<scope>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn fallback_file_name(scope_id: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    let scope: String = scope_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let scope = if scope.is_empty() { "scope".into() } else { scope };

    format!(
        "attendance_{scope}_{}.{}",
        file_stamp(now),
        format.extension()
    )
}

pub fn resolve_file_name(
    content_disposition: Option<&str>,
    scope_id: &str,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> String {
    content_disposition
        .and_then(from_content_disposition)
        .unwrap_or_else(|| fallback_file_name(scope_id, format, now))
}

fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = s.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).ok()
}
