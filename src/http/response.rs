//! Response bodies for trace and health requests.
//!
//! # Responsibilities
//! - Map a trace outcome to status code and JSON body
//! - Keep the degraded body shape stable for callers and the CLI
//!
//! # Design Decisions
//! - Success body is the bare chain, so it doubles as a downstream response
//! - Degraded traces use 502 and still carry the local hop

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::trace::{HopChain, TraceOutcome};

/// Body of a `502` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedTrace {
    pub error: String,
    pub chain: HopChain,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Status code a trace outcome is reported with.
pub fn outcome_status(outcome: &TraceOutcome) -> StatusCode {
    if outcome.is_degraded() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    }
}

impl IntoResponse for TraceOutcome {
    fn into_response(self) -> Response {
        let status = outcome_status(&self);
        match self {
            TraceOutcome::Complete(chain) => (status, Json(chain)).into_response(),
            TraceOutcome::Degraded { error, chain } => (
                status,
                Json(DegradedTrace {
                    error: error.report(),
                    chain,
                }),
            )
                .into_response(),
        }
    }
}
