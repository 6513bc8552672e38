//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject half-configured TLS
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TraceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::TraceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &TraceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.downstream.call_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "downstream.call_timeout_ms",
            "must be greater than zero",
        ));
    }
    if config.downstream.deadline_ms == 0 {
        errors.push(ValidationError::new(
            "downstream.deadline_ms",
            "must be greater than zero",
        ));
    }
    if config.downstream.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "downstream.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() || tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path must both be set",
            ));
        }
    }

    match config.observability.log_format.as_str() {
        "text" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format {other:?}, expected \"text\" or \"json\""),
        )),
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("{addr:?} is not a socket address"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TraceConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = TraceConfig::default();
        config.downstream.call_timeout_ms = 0;
        config.downstream.deadline_ms = 0;
        config.downstream.max_body_bytes = 0;
        config.observability.log_format = "yaml".into();
        config.observability.metrics_address = Some("nowhere".into());
        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: String::new(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "downstream.call_timeout_ms",
                "downstream.deadline_ms",
                "downstream.max_body_bytes",
                "listener.tls",
                "observability.log_format",
                "observability.metrics_address",
            ]
        );
    }
}
