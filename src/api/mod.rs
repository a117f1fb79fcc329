//! Server boundary: record fetch and export request.

pub mod http;
pub mod wire;

pub use http::HttpApi;
pub use wire::RecordBatch;

use crate::errors::AppResult;
use crate::export::ExportFormat;
use crate::models::Filter;
use async_trait::async_trait;

pub const RECORDS_PATH: &str = "/api/attendance/records";
pub const EXPORT_PATH: &str = "/api/attendance/export";
pub const STREAM_PATH: &str = "/api/attendance/stream";

/// Body and metadata of a server-rendered export.
#[derive(Debug, Clone, Default)]
pub struct ArtifactResponse {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

/// Requests the dashboard makes against the platform.
///
/// Implementations attach the credential themselves and must fail with
/// `AppError::Auth` without sending anything when they have none.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_records(&self, filter: &Filter) -> AppResult<RecordBatch>;

    async fn request_export(
        &self,
        filter: &Filter,
        format: ExportFormat,
    ) -> AppResult<ArtifactResponse>;
}
