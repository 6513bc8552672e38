//! Failure conditions of the downstream leg of a trace.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while extending a chain through a downstream.
///
/// Every variant is recovered inside the request handler and reported as a
/// degraded response; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The configured target was empty or whitespace.
    #[error("empty target url")]
    EmptyTarget,

    /// The normalized target is not a usable absolute URL.
    #[error("invalid target url {target:?}: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// Connection, DNS, per-call timeout, or body read failure.
    #[error("downstream call failed")]
    Transport(#[source] reqwest::Error),

    /// The outer per-request deadline elapsed before the call finished.
    #[error("downstream call failed: deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The downstream answered with something other than a hop chain.
    #[error("downstream returned non-JSON or unexpected shape")]
    UnexpectedShape(#[source] serde_json::Error),

    /// The downstream body exceeded the configured size cap.
    #[error("downstream returned non-JSON or unexpected shape: body larger than {0} bytes")]
    OversizedBody(usize),

    /// The outbound HTTP client could not be constructed.
    #[error("failed to build downstream client")]
    Client(#[source] reqwest::Error),
}

impl TraceError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TraceError::EmptyTarget | TraceError::InvalidTarget { .. } => "target",
            TraceError::Transport(_) | TraceError::Client(_) => "transport",
            TraceError::DeadlineExceeded(_) => "deadline",
            TraceError::UnexpectedShape(_) | TraceError::OversizedBody(_) => "shape",
        }
    }

    /// Message with every `source()` in the chain, joined by `": "`.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            // InvalidTarget already embeds its source in the display text.
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_source_chain() {
        let err = serde_json::from_str::<Vec<u8>>("{}").unwrap_err();
        let report = TraceError::UnexpectedShape(err).report();
        assert!(report.starts_with("downstream returned non-JSON or unexpected shape: "));
        assert!(report.contains("expected a sequence"), "{report}");
    }

    #[test]
    fn report_does_not_repeat_embedded_source() {
        let err = TraceError::InvalidTarget {
            target: "http://".into(),
            source: url::ParseError::EmptyHost,
        };
        let report = err.report();
        assert_eq!(report.matches("empty host").count(), 1, "{report}");
    }

    #[test]
    fn kinds_group_variants() {
        assert_eq!(TraceError::EmptyTarget.kind(), "target");
        assert_eq!(
            TraceError::DeadlineExceeded(Duration::from_secs(6)).kind(),
            "deadline"
        );
        assert_eq!(TraceError::OversizedBody(1024).kind(), "shape");
    }
}
