//! Push transport: trait seam plus the Server-Sent Events implementation.

use crate::api::STREAM_PATH;
use crate::api::http::{USER_AGENT, check_status, normalize_base_url};
use crate::errors::{AppError, AppResult};
use crate::models::Credential;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// One message from the push channel. The body is opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub event: Option<String>,
    pub data: String,
}

impl PushMessage {
    /// Keep-alive events that carry no change notification.
    pub fn is_heartbeat(&self) -> bool {
        matches!(
            self.event.as_deref(),
            Some("ping" | "heartbeat" | "keepalive")
        )
    }
}

pub type PushStream = BoxStream<'static, AppResult<PushMessage>>;

/// A long-lived, credential-scoped notification channel.
///
/// `connect` returns once the handshake succeeded; the stream ends (or
/// yields an error) when the connection drops. A rejected credential must
/// be reported as `AppError::Auth`.
#[async_trait]
pub trait PushChannel: Send + Sync + 'static {
    async fn connect(&self, scope_id: &str, credential: &Credential) -> AppResult<PushStream>;
}

/// Longest partial line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;
/// Largest `data` payload of a single event.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// Incremental `text/event-stream` decoder.
///
/// Feed raw chunks as they arrive; complete events come out. Chunk
/// boundaries may fall anywhere, including inside a UTF-8 sequence.
/// A line or event over the size limits is an error and resets the
/// decoder; callers treat it as a dropped connection.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> AppResult<Vec<PushMessage>> {
        self.pending.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(msg) = self.process_line(line) {
                out.push(msg);
            }
            if self.data_len > MAX_EVENT_BYTES {
                return Err(self.overflow(format!("event data over {MAX_EVENT_BYTES} bytes")));
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            return Err(self.overflow(format!("line over {MAX_LINE_BYTES} bytes")));
        }
        Ok(out)
    }

    fn overflow(&mut self, what: String) -> AppError {
        *self = Self::default();
        AppError::Protocol(format!("push stream: {what}"))
    }

    fn process_line(&mut self, line: &str) -> Option<PushMessage> {
        // event delimiter
        if line.is_empty() {
            let event = self.event.take();
            if self.data.is_empty() {
                return None;
            }
            let data = self.data.join("\n");
            self.data.clear();
            self.data_len = 0;
            return Some(PushMessage { event, data });
        }

        // comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data_len += value.len() + 1;
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            // id / retry / unknown fields: not needed for invalidation
            _ => {}
        }
        None
    }
}

/// SSE push channel on `GET {server_url}/api/attendance/stream?scope=…`.
pub struct SsePushChannel {
    client: Client,
    base_url: String,
}

impl SsePushChannel {
    /// No overall request timeout here: the response body is the stream.
    pub fn new(base_url: &str, connect_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Transport(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl PushChannel for SsePushChannel {
    async fn connect(&self, scope_id: &str, credential: &Credential) -> AppResult<PushStream> {
        let url = format!("{}{}", self.base_url, STREAM_PATH);
        debug!(url = %url, scope = scope_id, "opening push stream");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(credential.bearer())
            .header(ACCEPT, "text/event-stream")
            .query(&[("scope", scope_id)])
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let bytes = Box::pin(resp.bytes_stream());
        let state = (bytes, SseDecoder::default(), VecDeque::new());

        let messages = stream::unfold(state, |(mut bytes, mut decoder, mut ready)| async move {
            loop {
                if let Some(msg) = ready.pop_front() {
                    return Some((Ok(msg), (bytes, decoder, ready)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => match decoder.feed(&chunk) {
                        Ok(messages) => ready.extend(messages),
                        Err(e) => return Some((Err(e), (bytes, decoder, ready))),
                    },
                    Some(Err(e)) => return Some((Err(AppError::from(e)), (bytes, decoder, ready))),
                    None => return None,
                }
            }
        });

        Ok(messages.boxed())
    }
}
