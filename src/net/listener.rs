//! TCP listener with address-family selection.
//!
//! # Responsibilities
//! - Pick the wildcard address for the configured family
//! - Build the socket (v6-only flag, reuse, backlog) and bind it
//! - Hand the bound socket to the plain or TLS server
//!
//! # Address Families
//! ```text
//! ipv4  → 0.0.0.0:<port>
//! ipv6  → [::]:<port>, IPV6_V6ONLY=1
//! dual  → [::]:<port>, IPV6_V6ONLY=0   (0.0.0.0:<port> if the host has no IPv6)
//! ```
//!
//! # Design Decisions
//! - Any bind failure is returned to startup, which exits the process
//! - Dual stack only falls back when IPv6 sockets cannot be created at all

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use thiserror::Error;

use crate::config::{IpMode, ListenerConfig};

const BACKLOG: i32 = 1024;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to create or bind the socket.
    #[error("failed to start {mode} listener on {addr}: {source}")]
    Bind {
        mode: IpMode,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// A bound, listening TCP socket.
#[derive(Debug)]
pub struct Listener {
    inner: std::net::TcpListener,
    mode: IpMode,
}

impl Listener {
    /// Bind according to the configured port and address family.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let port = config.port;
        let inner = match config.ip_mode {
            IpMode::Ipv4 => bind_socket(IpMode::Ipv4, ipv4_any(port), None)?,
            IpMode::Ipv6 => bind_socket(IpMode::Ipv6, ipv6_any(port), Some(true))?,
            IpMode::Dual => match bind_socket(IpMode::Dual, ipv6_any(port), Some(false)) {
                Ok(listener) => listener,
                Err(ListenerError::Bind { source, .. }) if ipv6_unsupported(&source) => {
                    tracing::warn!(
                        error = %source,
                        "IPv6 unavailable, dual-stack listener falling back to IPv4"
                    );
                    bind_socket(IpMode::Dual, ipv4_any(port), None)?
                }
                Err(e) => return Err(e),
            },
        };

        let listener = Self {
            inner,
            mode: config.ip_mode,
        };
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, ip_mode = %listener.mode, "Listener bound");
        }
        Ok(listener)
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn ip_mode(&self) -> IpMode {
        self.mode
    }

    /// Convert into a tokio listener. Must be called within a runtime.
    pub fn into_tokio(self) -> io::Result<tokio::net::TcpListener> {
        tokio::net::TcpListener::from_std(self.inner)
    }

    /// The underlying non-blocking std listener.
    pub fn into_std(self) -> std::net::TcpListener {
        self.inner
    }
}

fn ipv4_any(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

fn ipv6_any(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv6Addr::UNSPECIFIED, port))
}

fn bind_socket(
    mode: IpMode,
    addr: SocketAddr,
    only_v6: Option<bool>,
) -> Result<std::net::TcpListener, ListenerError> {
    let wrap = |source| ListenerError::Bind { mode, addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(wrap)?;
    if let Some(only_v6) = only_v6 {
        socket.set_only_v6(only_v6).map_err(wrap)?;
    }
    socket.set_reuse_address(true).map_err(wrap)?;
    socket.bind(&SockAddr::from(addr)).map_err(wrap)?;
    socket.listen(BACKLOG).map_err(wrap)?;
    socket.set_nonblocking(true).map_err(wrap)?;

    Ok(socket.into())
}

fn ipv6_unsupported(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        matches!(
            err.raw_os_error(),
            Some(code) if code == nix::libc::EAFNOSUPPORT || code == nix::libc::EADDRNOTAVAIL
        )
    }
    #[cfg(not(unix))]
    {
        err.kind() == io::ErrorKind::AddrNotAvailable || err.kind() == io::ErrorKind::Unsupported
    }
}
