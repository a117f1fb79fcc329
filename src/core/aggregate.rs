//! Reduction of raw attendance records to a Summary.
//!
//! Pure: no I/O, no clock, no dependence on input order.

use crate::models::{AttendanceStatus, Filter, RawRecord, Summary};
use std::collections::HashMap;

/// True when `record` belongs to the view described by `filter`.
pub fn is_included(record: &RawRecord, filter: &Filter) -> bool {
    if record.scope_id != filter.scope_id {
        return false;
    }
    match &filter.date_range {
        Some(range) => range.contains(record.timestamp.date_naive()),
        None => true,
    }
}

/// Records included by `filter`, one per id, sorted by (timestamp, id).
///
/// When the server sends the same id twice, the duplicate that wins is the
/// one with the greatest `RawRecord::precedence`, so the result does not
/// depend on the order the records arrived in.
pub fn included_records<'a>(records: &'a [RawRecord], filter: &Filter) -> Vec<&'a RawRecord> {
    let mut by_id: HashMap<&str, &RawRecord> = HashMap::new();

    for rec in records.iter().filter(|r| is_included(r, filter)) {
        by_id
            .entry(rec.id.as_str())
            .and_modify(|cur| {
                if rec.precedence(cur).is_gt() {
                    *cur = rec;
                }
            })
            .or_insert(rec);
    }

    let mut out: Vec<&RawRecord> = by_id.into_values().collect();
    out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    out
}

pub fn summarize(records: &[RawRecord], filter: &Filter) -> Summary {
    let (mut present, mut absent, mut late) = (0u64, 0u64, 0u64);

    for rec in included_records(records, filter) {
        match rec.status.tally_bucket() {
            AttendanceStatus::Present => present += 1,
            AttendanceStatus::Late => late += 1,
            _ => absent += 1,
        }
    }

    Summary::from_counts(present, absent, late)
}
