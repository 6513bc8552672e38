//! Downstream target normalization.
//!
//! Operators usually configure the downstream as a bare `host:port/path`.
//! The scheme is inferred from the port: only a literal `443` means `https`.
//! A TLS downstream on any other port must be configured with an explicit
//! scheme.

use url::Url;

use crate::trace::error::TraceError;

/// Turn a configured target into an absolute URL for the outbound call.
pub fn normalize_target(raw: &str) -> Result<String, TraceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TraceError::EmptyTarget);
    }

    let normalized = if has_explicit_scheme(raw) {
        raw.to_string()
    } else {
        format!("{}://{}", infer_scheme(raw), raw)
    };

    Url::parse(&normalized).map_err(|source| TraceError::InvalidTarget {
        target: normalized.clone(),
        source,
    })?;

    Ok(normalized)
}

fn has_explicit_scheme(raw: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

fn infer_scheme(raw: &str) -> &'static str {
    let host_port = raw.split('/').next().unwrap_or(raw);
    if host_port.starts_with('[') {
        return "http";
    }
    match host_port.split_once(':') {
        Some((_, port)) if !port.contains(':') && port == "443" => "https",
        _ => "http",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_are_unchanged() {
        for url in [
            "http://svc:8080/trace",
            "https://svc/trace?x=1",
            "HTTPS://Svc:9443/",
            "Http://svc",
        ] {
            assert_eq!(normalize_target(url).unwrap(), url);
        }
    }

    #[test]
    fn port_443_infers_https() {
        assert_eq!(
            normalize_target("host:443/path").unwrap(),
            "https://host:443/path"
        );
        assert_eq!(normalize_target("host:443").unwrap(), "https://host:443");
    }

    #[test]
    fn other_ports_infer_http() {
        assert_eq!(
            normalize_target("host:8080/path").unwrap(),
            "http://host:8080/path"
        );
        assert_eq!(normalize_target("host:8443").unwrap(), "http://host:8443");
        assert_eq!(normalize_target("host").unwrap(), "http://host");
        assert_eq!(normalize_target("host/a:443").unwrap(), "http://host/a:443");
    }

    #[test]
    fn bracketed_ipv6_is_always_http() {
        assert_eq!(
            normalize_target("[::1]:443/x").unwrap(),
            "http://[::1]:443/x"
        );
    }

    #[test]
    fn empty_or_blank_target_fails() {
        assert!(matches!(normalize_target(""), Err(TraceError::EmptyTarget)));
        assert!(matches!(
            normalize_target("  \t "),
            Err(TraceError::EmptyTarget)
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            normalize_target("  svc:443/ ").unwrap(),
            "https://svc:443/"
        );
    }

    #[test]
    fn unparseable_target_is_rejected() {
        let err = normalize_target("bad host:80").unwrap_err();
        assert!(matches!(err, TraceError::InvalidTarget { .. }), "{err}");
    }
}
