//! Configuration loading from disk and the process environment.

use std::path::Path;
use std::fs;
use crate::config::schema::{IpMode, TlsConfig, TraceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "HOP_TRACE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Build the process configuration from the environment.
///
/// Defaults, then the file named by `HOP_TRACE_CONFIG` if any, then
/// individual environment variables.
pub fn from_env() -> Result<TraceConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Same as [`from_env`] with an injectable variable lookup.
pub fn from_lookup<F>(lookup: F) -> Result<TraceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match non_empty(&lookup, CONFIG_FILE_ENV) {
        Some(path) => read_file(Path::new(&path))?,
        None => TraceConfig::default(),
    };
    apply_env_overrides(&mut config, &lookup)?;
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut TraceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = non_empty(&lookup, "PORT") {
        config.listener.port = parse_number("PORT", port)?;
    }
    if let Some(mode) = non_empty(&lookup, "IP_MODE") {
        config.listener.ip_mode = IpMode::from_setting(&mode);
    }
    if let Some(grace) = non_empty(&lookup, "SHUTDOWN_GRACE_SECS") {
        config.listener.shutdown_grace_secs = parse_number("SHUTDOWN_GRACE_SECS", grace)?;
    }

    let cert = non_empty(&lookup, "TLS_CERT_FILE");
    let key = non_empty(&lookup, "TLS_KEY_FILE");
    if cert.is_some() || key.is_some() {
        config.listener.tls = Some(TlsConfig {
            cert_path: cert.unwrap_or_default(),
            key_path: key.unwrap_or_default(),
        });
    }

    if let Some(node) = non_empty(&lookup, "NODE_NAME") {
        config.identity.node_name = node;
    }
    if let Some(pod) = non_empty(&lookup, "POD_NAME") {
        config.identity.pod_name = pod;
    }

    if let Some(target) = non_empty(&lookup, "CALL_SERVICE") {
        config.downstream.target = target;
    }
    if let Some(timeout) = non_empty(&lookup, "CALL_TIMEOUT_MS") {
        config.downstream.call_timeout_ms = parse_number("CALL_TIMEOUT_MS", timeout)?;
    }
    if let Some(deadline) = non_empty(&lookup, "CALL_DEADLINE_MS") {
        config.downstream.deadline_ms = parse_number("CALL_DEADLINE_MS", deadline)?;
    }
    if let Some(limit) = non_empty(&lookup, "CALL_MAX_BODY_BYTES") {
        config.downstream.max_body_bytes = parse_number("CALL_MAX_BODY_BYTES", limit)?;
    }

    if let Some(level) = non_empty(&lookup, "LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = non_empty(&lookup, "LOG_FORMAT") {
        config.observability.log_format = format;
    }
    if let Some(addr) = non_empty(&lookup, "METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }

    Ok(())
}

/// Case-fold settings that may come from either the file or the environment.
fn normalize(config: &mut TraceConfig) {
    let format = config.observability.log_format.trim().to_ascii_lowercase();
    config.observability.log_format = format;
}

fn read_file(path: &Path) -> Result<TraceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}
