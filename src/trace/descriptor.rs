//! Self-descriptor: the local hop record for an inbound request.
//!
//! # Field sources
//! ```text
//! request_source_ip      ← X-Forwarded-For (left-most) | peer IP | ""
//! request_destination_ip ← accepted local ip:port | ""
//! request_url            ← scheme :// Host + path?query
//!     scheme             ← "https" if TLS ended here | X-Forwarded-Proto | "http"
//! incoming_headers       ← deep copy of the request headers
//! ts                     ← capture time, UTC, fixed-width nanoseconds
//! ```
//!
//! Capturing never fails: anything that cannot be determined is left empty.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, Uri};
use chrono::{SecondsFormat, Utc};

use crate::config::IdentityConfig;
use crate::trace::record::{HeaderSnapshot, HopRecord};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Everything the local responder can observe about one inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub headers: &'a HeaderMap,
    pub uri: &'a Uri,
    /// Transport peer, if the server exposed it.
    pub peer: Option<SocketAddr>,
    /// Local address the connection was accepted on, if known.
    pub local: Option<SocketAddr>,
    /// Whether TLS was terminated by this responder.
    pub tls: bool,
}

/// Builds [`HopRecord`]s for this process.
///
/// Identity and host name are resolved once and reused for every request.
#[derive(Debug, Clone)]
pub struct SelfDescriptor {
    node_name: String,
    pod_name: String,
    hostname: String,
}

impl SelfDescriptor {
    /// Create a descriptor, resolving the local host name.
    pub fn new(identity: &IdentityConfig) -> Self {
        Self::with_hostname(identity, local_hostname())
    }

    /// Create a descriptor with an explicit host name.
    pub fn with_hostname(identity: &IdentityConfig, hostname: impl Into<String>) -> Self {
        Self {
            node_name: identity.node_name.clone(),
            pod_name: identity.pod_name.clone(),
            hostname: hostname.into(),
        }
    }

    /// Capture the local hop for `request`.
    pub fn capture(&self, request: &RequestView<'_>) -> HopRecord {
        HopRecord::new(
            self.node_name.clone(),
            self.pod_name.clone(),
            self.hostname.clone(),
            source_address(request),
            request
                .local
                .map(|addr| canonical(addr).to_string())
                .unwrap_or_default(),
            request_url(request),
            copy_headers(request.headers),
            capture_timestamp(),
        )
    }
}

fn source_address(request: &RequestView<'_>) -> String {
    let forwarded = request
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    match forwarded {
        Some(first) => first.to_string(),
        None => request
            .peer
            .map(|addr| canonical(addr).ip().to_string())
            .unwrap_or_default(),
    }
}

/// Report IPv4 peers on dual-stack sockets as plain IPv4.
fn canonical(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

fn scheme(request: &RequestView<'_>) -> String {
    if request.tls {
        return "https".to_string();
    }
    request
        .headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|proto| !proto.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "http".to_string())
}

fn request_url(request: &RequestView<'_>) -> String {
    let host = request
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default();
    let path_and_query = request
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme(request), host, path_and_query)
}

fn copy_headers(headers: &HeaderMap) -> HeaderSnapshot {
    let mut snapshot = HeaderSnapshot::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        snapshot.insert(name.as_str().to_string(), values);
    }
    snapshot
}

fn capture_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[cfg(unix)]
fn local_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to resolve hostname");
            String::new()
        }
    }
}

#[cfg(not(unix))]
fn local_hostname() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_default()
}
