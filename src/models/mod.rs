pub mod credential;
pub mod export_job;
pub mod filter;
pub mod record;
pub mod summary;

pub use credential::Credential;
pub use export_job::{ExportFailure, ExportJob, ExportState};
pub use filter::{DateRange, Filter};
pub use record::{AttendanceStatus, RawRecord};
pub use summary::Summary;
