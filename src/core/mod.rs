pub mod aggregate;
pub mod dashboard;

pub use aggregate::summarize;
pub use dashboard::{Dashboard, DashboardSnapshot, RefreshOutcome};
