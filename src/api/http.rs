// src/api/http.rs

use crate::api::wire::{self, RecordBatch};
use crate::api::{ArtifactResponse, DashboardApi, EXPORT_PATH, RECORDS_PATH};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::models::{Credential, Filter};
use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::debug;

pub(crate) const USER_AGENT: &str = concat!("rattendance/", env!("CARGO_PKG_VERSION"));

/// Normalised `http(s)://host[:port][/prefix]` without trailing slash.
pub(crate) fn normalize_base_url(base_url: &str) -> AppResult<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Config(format!("invalid server_url '{base_url}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "server_url must be http or https: {base_url}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Map a non-success response onto the error taxonomy.
pub(crate) async fn check_status(resp: Response) -> AppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.bytes().await.unwrap_or_default();
    let message = wire::error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));

    match status.as_u16() {
        401 | 403 => Err(AppError::Auth(message)),
        code => Err(AppError::Server {
            status: code,
            message,
        }),
    }
}

/// reqwest-backed implementation of [`DashboardApi`].
pub struct HttpApi {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration, credential: Option<Credential>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Transport(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            credential,
        })
    }

    pub fn from_config(cfg: &Config, credential: Option<Credential>) -> AppResult<Self> {
        Self::new(
            &cfg.server_url,
            Duration::from_secs(cfg.request_timeout_secs),
            credential,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn credential(&self) -> AppResult<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| AppError::Auth("no credential configured".into()))
    }

    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> AppResult<Response> {
        let token = self.credential()?;
        let url = format!("{}{}", self.base_url, path);

        debug!(url = %url, "GET");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(token.bearer())
            .query(query)
            .send()
            .await?;

        check_status(resp).await
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_records(&self, filter: &Filter) -> AppResult<RecordBatch> {
        filter.validate()?;

        let resp = self.get(RECORDS_PATH, &filter.query_pairs()).await?;
        let body = resp.bytes().await?;

        wire::parse_records(&body, &filter.scope_id)
    }

    async fn request_export(
        &self,
        filter: &Filter,
        format: ExportFormat,
    ) -> AppResult<ArtifactResponse> {
        filter.validate()?;

        let mut query = filter.query_pairs();
        query.push(("format", format.as_str().to_string()));

        let resp = self.get(EXPORT_PATH, &query).await?;

        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_disposition = header(CONTENT_DISPOSITION);
        let content_type = header(CONTENT_TYPE);

        let bytes = resp.bytes().await?.to_vec();

        Ok(ArtifactResponse {
            bytes,
            content_disposition,
            content_type,
        })
    }
}
