//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the responder.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a hop-trace responder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TraceConfig {
    /// Listener configuration (port, address family, TLS).
    pub listener: ListenerConfig,

    /// Identity reported in every local hop.
    pub identity: IdentityConfig,

    /// Downstream responder settings.
    pub downstream: DownstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Address family selection.
    pub ip_mode: IpMode,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            ip_mode: IpMode::Dual,
            tls: None,
            shutdown_grace_secs: 10,
        }
    }
}

/// Address family the listener binds with.
///
/// Parsing is lenient: `ipv4` and `ipv6` (any case) select a single family,
/// everything else means dual stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum IpMode {
    #[default]
    Dual,
    Ipv4,
    Ipv6,
}

impl IpMode {
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ipv4" => IpMode::Ipv4,
            "ipv6" => IpMode::Ipv6,
            _ => IpMode::Dual,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpMode::Dual => "dual",
            IpMode::Ipv4 => "ipv4",
            IpMode::Ipv6 => "ipv6",
        }
    }
}

impl From<String> for IpMode {
    fn from(value: String) -> Self {
        IpMode::from_setting(&value)
    }
}

impl std::fmt::Display for IpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Who this responder is.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Cluster node name (may be empty).
    pub node_name: String,

    /// Pod or instance name (may be empty).
    pub pod_name: String,
}

/// Downstream responder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Raw downstream address; empty makes this responder the terminus.
    pub target: String,

    /// Fixed timeout for a single downstream call, in milliseconds.
    pub call_timeout_ms: u64,

    /// Outer deadline for the whole downstream leg, in milliseconds.
    pub deadline_ms: u64,

    /// Largest downstream body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            call_timeout_ms: 5_000,
            deadline_ms: 6_000,
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format: `text` or `json`.
    pub log_format: String,

    /// Prometheus endpoint bind address; metrics are off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_mode_parsing_is_lenient() {
        assert_eq!(IpMode::from_setting("IPv4"), IpMode::Ipv4);
        assert_eq!(IpMode::from_setting("ipv6"), IpMode::Ipv6);
        assert_eq!(IpMode::from_setting(""), IpMode::Dual);
        assert_eq!(IpMode::from_setting("both"), IpMode::Dual);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = TraceConfig::default();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.ip_mode, IpMode::Dual);
        assert_eq!(config.downstream.call_timeout_ms, 5_000);
        assert_eq!(config.downstream.deadline_ms, 6_000);
        assert!(config.downstream.target.is_empty());
        assert!(config.observability.metrics_address.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TraceConfig = toml::from_str(
            r#"
            [listener]
            ip_mode = "IPV6"

            [downstream]
            target = "next-hop:8080"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.ip_mode, IpMode::Ipv6);
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.downstream.target, "next-hop:8080");
        assert_eq!(config.downstream.deadline_ms, 6_000);
    }
}
