//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → request.rs (connection addresses, TLS marker → RequestView)
//!     → trace::Tracer (capture, call downstream, merge)
//!     → response.rs (200 chain | 502 error + local hop)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ConnectionInfo, GeneratedRequestId, TlsTerminated, X_REQUEST_ID};
pub use response::{DegradedTrace, HealthStatus};
pub use server::{AppState, HttpServer, HEALTH_PATH};
