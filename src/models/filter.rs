// src/models/filter.rs

use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidDate(format!(
                "range start {start} is after range end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Parse --range (year / month / day / intervallo).
    ///
    /// Supporta:
    /// - YYYY
    /// - YYYY-MM
    /// - YYYY-MM-DD
    /// - YYYY:YYYY
    /// - YYYY-MM:YYYY-MM
    /// - YYYY-MM-DD:YYYY-MM-DD
    ///
    /// `all` (any case) means no range and yields `Ok(None)`.
    pub fn parse(r: &str) -> AppResult<Option<Self>> {
        let r = r.trim();
        if r.eq_ignore_ascii_case("all") {
            return Ok(None);
        }

        let (start, end) = match r.split_once(':') {
            Some((s, e)) => {
                let (s, e) = (s.trim(), e.trim());
                if s.len() != e.len() {
                    return Err(AppError::InvalidDate(format!(
                        "start and end must have same format: {r}"
                    )));
                }
                (period_bounds(s)?.0, period_bounds(e)?.1)
            }
            None => period_bounds(r)?,
        };

        Self::new(start, end).map(Some)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} → {}", self.start, self.end)
        }
    }
}

/// First and last day covered by a single period token.
fn period_bounds(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidDate(p.to_string());

    match p.len() {
        // YYYY
        4 => {
            let y: i32 = p.parse().map_err(|_| invalid())?;
            let first = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(invalid)?;
            let last = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(invalid)?;
            Ok((first, last))
        }
        // YYYY-MM
        7 => {
            let first =
                NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
            let last = month_last_day(first).ok_or_else(invalid)?;
            Ok((first, last))
        }
        // YYYY-MM-DD
        10 => {
            let d = NaiveDate::parse_from_str(p, "%Y-%m-%d").map_err(|_| invalid())?;
            Ok((d, d))
        }
        _ => Err(AppError::InvalidDate(format!(
            "unsupported --range format: {p}"
        ))),
    }
}

fn month_last_day(first: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

/// Query parameters for one dashboard view.
///
/// A Filter is a value: changing any field means building a new one, and a
/// new one invalidates whatever was fetched under the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub scope_id: String,
    pub date_range: Option<DateRange>,
    pub export_format: Option<ExportFormat>,
}

impl Filter {
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into().trim().to_string(),
            date_range: None,
            export_format: None,
        }
    }

    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.export_format = Some(format);
        self
    }

    pub fn has_scope(&self) -> bool {
        !self.scope_id.is_empty()
    }

    /// Local precondition check, run before anything touches the network.
    pub fn validate(&self) -> AppResult<()> {
        if !self.has_scope() {
            return Err(AppError::validation("no scope selected"));
        }
        if let Some(range) = &self.date_range
            && range.start > range.end
        {
            return Err(AppError::validation(format!(
                "date range start {} is after end {}",
                range.start, range.end
            )));
        }
        Ok(())
    }

    /// `(key, value)` pairs sent as query string to the server.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q = vec![("scope", self.scope_id.clone())];
        if let Some(r) = &self.date_range {
            q.push(("start", r.start.format("%Y-%m-%d").to_string()));
            q.push(("end", r.end.format("%Y-%m-%d").to_string()));
        }
        q
    }
}
