use serde::{Deserialize, Serialize};

/// Aggregate attendance numbers for one view.
///
/// Derived only: built by `core::aggregate::summarize` from records and a
/// filter, never stored on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub percentage: u8,
}

impl Summary {
    pub fn from_counts(present: u64, absent: u64, late: u64) -> Self {
        let total = present + absent + late;
        Self {
            total,
            present,
            absent,
            late,
            percentage: percentage_half_up(present, total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// `round(part / total * 100)` with halves rounded up; `0` for `total == 0`.
pub fn percentage_half_up(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u128;
    let total = total as u128;
    ((part * 200 + total) / (total * 2)) as u8
}
