//! Outbound call to the configured downstream responder.

use std::time::Duration;

use axum::http::HeaderValue;
use reqwest::Client;

use crate::http::X_REQUEST_ID;
use crate::trace::error::TraceError;
use crate::trace::record::HopChain;

const USER_AGENT: &str = concat!("hop-trace/", env!("CARGO_PKG_VERSION"));

/// Body cap used unless configured otherwise.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// HTTP client for fetching a downstream's hop chain.
///
/// Every call is bounded by a fixed per-call timeout, independent of any
/// deadline the caller layers on top, and by a cap on the body size.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: Client,
    max_body_bytes: usize,
}

impl DownstreamClient {
    /// Build a client whose calls time out after `call_timeout`.
    pub fn new(call_timeout: Duration) -> Result<Self, TraceError> {
        let client = Client::builder()
            .timeout(call_timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(TraceError::Client)?;

        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Reject downstream bodies larger than `limit` bytes.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// GET `url` and decode the body as a hop chain.
    ///
    /// The status code is not inspected: a downstream that answers with a
    /// degraded body fails the shape check like any other non-chain body.
    pub async fn fetch_chain(
        &self,
        url: &str,
        request_id: Option<&HeaderValue>,
    ) -> Result<HopChain, TraceError> {
        let mut request = self.client.get(url);
        if let Some(id) = request_id {
            request = request.header(X_REQUEST_ID, id.clone());
        }

        let mut response = request.send().await.map_err(TraceError::Transport)?;
        let status = response.status();

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(TraceError::OversizedBody(limit));
        }

        // Dropping the response on overflow closes the connection.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(TraceError::Transport)? {
            if body.len() + chunk.len() > limit {
                return Err(TraceError::OversizedBody(limit));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %url,
            status = %status,
            bytes = body.len(),
            "Downstream responded"
        );

        serde_json::from_slice(&body).map_err(TraceError::UnexpectedShape)
    }
}
