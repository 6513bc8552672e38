//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the trace and health handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener, plain or TLS
//! - Drain in-flight requests on shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Extension, Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{TlsConfig, TraceConfig};
use crate::http::request::{
    mark_missing_request_id, request_view, take_request_id, ConnectionInfo, TlsTerminated,
};
use crate::http::response::{outcome_status, HealthStatus};
use crate::net::listener::Listener;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::trace::{TraceError, Tracer};

/// Path answered without any tracing.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracer: Arc<Tracer>,
}

/// HTTP server for the hop-trace responder.
pub struct HttpServer {
    router: Router,
    config: TraceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: TraceConfig) -> Result<Self, TraceError> {
        let tracer = Tracer::from_config(&config.identity, &config.downstream)?;
        Ok(Self::with_tracer(config, tracer))
    }

    /// Create a server around an already-built tracer.
    pub fn with_tracer(config: TraceConfig, tracer: Tracer) -> Self {
        let state = AppState {
            tracer: Arc::new(tracer),
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route(HEALTH_PATH, any(health_handler))
            .fallback(trace_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(mark_missing_request_id))
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router without connection handling, for embedding or tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ip_mode = %listener.ip_mode(),
            downstream = self.config.downstream.target.as_str(),
            "HTTP server starting"
        );

        match self.config.listener.tls.clone() {
            Some(tls) => self.serve_tls(listener, &tls, shutdown).await?,
            None => self.serve_plain(listener, shutdown).await?,
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn serve_plain(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let listener = listener.into_tokio()?;
        let app = self
            .router
            .into_make_service_with_connect_info::<ConnectionInfo>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await
    }

    async fn serve_tls(
        self,
        listener: Listener,
        tls: &TlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = load_tls_config(tls).await?;
        let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(grace = ?grace, "Shutdown signal received, draining TLS connections");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        let app = self
            .router
            .layer(Extension(TlsTerminated))
            .into_make_service_with_connect_info::<ConnectionInfo>();

        axum_server::from_tcp_rustls(listener.into_std(), rustls)
            .handle(handle)
            .serve(app)
            .await
    }
}

/// Trace handler for every path except the health path.
async fn trace_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (mut parts, _) = request.into_parts();
    let request_id = take_request_id(&mut parts);

    tracing::debug!(
        request_id = ?request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Tracing request"
    );

    let view = request_view(&parts);
    let outcome = state.tracer.trace(&view, request_id.as_ref()).await;

    let status = outcome_status(&outcome);
    let label = if outcome.is_degraded() { "degraded" } else { "complete" };
    metrics::record_trace(label, status.as_u16(), outcome.chain().len(), start_time);

    outcome.into_response()
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
