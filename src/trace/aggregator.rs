//! Chain aggregation for one trace request.
//!
//! # States
//! ```text
//! start → self-captured ─┬─ no target ──────────────────────→ Complete([self])
//!                        └─ target → invoking ─┬─ ok ────────→ Complete(chain + self)
//!                                              └─ failed ────→ Degraded(error, [self])
//! ```
//!
//! A failed downstream is reported once; retrying is left to whoever
//! re-issues the trace.

use std::time::{Duration, Instant};

use axum::http::HeaderValue;

use crate::config::{DownstreamConfig, IdentityConfig};
use crate::observability::metrics;
use crate::trace::descriptor::{RequestView, SelfDescriptor};
use crate::trace::error::TraceError;
use crate::trace::invoker::DownstreamClient;
use crate::trace::record::HopChain;
use crate::trace::target::normalize_target;

/// Result of a trace request, before it is turned into a response.
#[derive(Debug)]
pub enum TraceOutcome {
    /// Full chain, local hop last.
    Complete(HopChain),
    /// Downstream could not be traced; `chain` holds only the local hop.
    Degraded { error: TraceError, chain: HopChain },
}

impl TraceOutcome {
    pub fn chain(&self) -> &HopChain {
        match self {
            TraceOutcome::Complete(chain) => chain,
            TraceOutcome::Degraded { chain, .. } => chain,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TraceOutcome::Degraded { .. })
    }
}

/// Captures the local hop and extends it through the configured downstream.
#[derive(Debug, Clone)]
pub struct Tracer {
    descriptor: SelfDescriptor,
    target: Option<String>,
    client: DownstreamClient,
    deadline: Duration,
}

impl Tracer {
    pub fn new(descriptor: SelfDescriptor, downstream: &DownstreamConfig) -> Result<Self, TraceError> {
        let client = DownstreamClient::new(Duration::from_millis(downstream.call_timeout_ms))?
            .with_max_body_bytes(downstream.max_body_bytes);
        let target = Some(downstream.target.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            descriptor,
            target,
            client,
            deadline: Duration::from_millis(downstream.deadline_ms),
        })
    }

    /// Build a tracer straight from the identity and downstream settings.
    pub fn from_config(identity: &IdentityConfig, downstream: &DownstreamConfig) -> Result<Self, TraceError> {
        Self::new(SelfDescriptor::new(identity), downstream)
    }

    /// Raw configured target, `None` for a terminus.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Run the trace protocol for one inbound request.
    pub async fn trace(&self, request: &RequestView<'_>, request_id: Option<&HeaderValue>) -> TraceOutcome {
        let local = self.descriptor.capture(request);

        let Some(target) = self.target.as_deref() else {
            return TraceOutcome::Complete(HopChain::terminus(local));
        };

        let started = Instant::now();
        let result = self.extend(target, request_id).await;
        let result_label = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_downstream_call(result_label, started);

        match result {
            Ok(mut chain) => {
                chain.append(local);
                TraceOutcome::Complete(chain)
            }
            Err(error) => {
                tracing::warn!(
                    target_url = %target,
                    kind = error.kind(),
                    error = %error.report(),
                    "Downstream trace failed"
                );
                TraceOutcome::Degraded {
                    error,
                    chain: HopChain::terminus(local),
                }
            }
        }
    }

    async fn extend(&self, target: &str, request_id: Option<&HeaderValue>) -> Result<HopChain, TraceError> {
        let url = normalize_target(target)?;
        tracing::debug!(url = %url, deadline = ?self.deadline, "Calling downstream");

        // Dropping the fetch on deadline aborts the in-flight call.
        tokio::time::timeout(self.deadline, self.client.fetch_chain(&url, request_id))
            .await
            .map_err(|_| TraceError::DeadlineExceeded(self.deadline))?
    }
}
