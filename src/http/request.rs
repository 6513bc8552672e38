//! Per-connection facts and the request view handed to the tracer.
//!
//! # Responsibilities
//! - Record peer and accepted local address for every connection
//! - Mark connections whose TLS was terminated by this responder
//! - Expose the observable parts of a request as a `RequestView`
//! - Keep a generated request ID out of the captured headers
//!
//! # Design Decisions
//! - Request ID set as early as possible (tower-http layer) so it can be
//!   forwarded downstream and echoed in the response
//! - The local hop only records an `x-request-id` the client actually sent
//! - Missing connection info degrades to empty addresses, never an error

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::connect_info::{ConnectInfo, Connected};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

use crate::trace::RequestView;

/// Correlation header set on every request and forwarded downstream.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Addresses of the connection a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub peer: SocketAddr,
    /// Local address the connection was accepted on, when the server exposes it.
    pub local: Option<SocketAddr>,
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self {
            peer: *stream.remote_addr(),
            local: stream.io().local_addr().ok(),
        }
    }
}

/// The TLS server only reports the peer.
impl Connected<SocketAddr> for ConnectionInfo {
    fn connect_info(peer: SocketAddr) -> Self {
        Self { peer, local: None }
    }
}

/// Request extension marking TLS terminated by this responder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTerminated;

/// Request extension marking an `x-request-id` this responder generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedRequestId;

/// Tag requests that arrive without a request ID.
///
/// Must run outside `SetRequestIdLayer`, which fills the header in.
pub async fn mark_missing_request_id(mut request: Request<Body>, next: Next) -> Response {
    if !request.headers().contains_key(X_REQUEST_ID) {
        request.extensions_mut().insert(GeneratedRequestId);
    }
    next.run(request).await
}

/// Take the request ID to forward downstream.
///
/// A generated ID is removed from the headers so they read as received.
pub fn take_request_id(parts: &mut Parts) -> Option<HeaderValue> {
    if parts.extensions.get::<GeneratedRequestId>().is_some() {
        parts.headers.remove(X_REQUEST_ID)
    } else {
        parts.headers.get(X_REQUEST_ID).cloned()
    }
}

/// Borrow the observable attributes of a request.
pub fn request_view(parts: &Parts) -> RequestView<'_> {
    let connection = parts
        .extensions
        .get::<ConnectInfo<ConnectionInfo>>()
        .map(|ConnectInfo(info)| *info);

    RequestView {
        headers: &parts.headers,
        uri: &parts.uri,
        peer: connection.map(|c| c.peer),
        local: connection.and_then(|c| c.local),
        tls: parts.extensions.get::<TlsTerminated>().is_some(),
    }
}
