//! Hop-trace network path diagnostic responder library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod trace;

pub use config::TraceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use trace::{HopChain, HopRecord, Tracer};
