/// ANSI color helper utilities for terminal output.
use std::sync::OnceLock;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Attendance percentage color:
/// ≥ 90 → green
/// ≥ 75 → yellow
/// otherwise → red
pub fn color_for_percentage(pct: u8) -> &'static str {
    match pct {
        90.. => GREEN,
        75..=89 => YELLOW,
        _ => RED,
    }
}

/// Grey for values that are only an old copy of the truth.
pub fn color_for_staleness(stale: bool) -> &'static str {
    if stale { GREY } else { RESET }
}

/// `NO_COLOR` (any value) turns the escape codes off.
pub fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("NO_COLOR").is_none())
}

pub fn colorize(text: &str, color: &str) -> String {
    if colors_enabled() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}
