//! Hop-trace network path diagnostic responder.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ instance A ──▶ instance B ──▶ instance C (no downstream)
//!                    │              │              │
//!     [A, B, C] ◀────┴── [B, C] ◀───┴──── [C] ◀────┘
//! ```
//!
//! Each instance captures how it saw the incoming request, optionally asks
//! the next instance in the chain for its view, and answers with the chain
//! ordered farthest hop first and itself last.

use std::net::SocketAddr;

use hop_trace::config;
use hop_trace::lifecycle::Shutdown;
use hop_trace::net::Listener;
use hop_trace::observability::{logging, metrics};
use hop_trace::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hop-trace: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("hop-trace: failed to initialize logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hop-trace starting");
    tracing::info!(
        port = config.listener.port,
        ip_mode = %config.listener.ip_mode,
        node_name = config.identity.node_name.as_str(),
        pod_name = config.identity.pod_name.as_str(),
        downstream = config.downstream.target.as_str(),
        call_timeout_ms = config.downstream.call_timeout_ms,
        deadline_ms = config.downstream.deadline_ms,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if let Some(address) = config.observability.metrics_address.as_deref() {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match Listener::bind(&config.listener) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.listen_for_signals();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
