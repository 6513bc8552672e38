//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (HOP_TRACE_CONFIG)
//!     → environment variables (PORT, IP_MODE, CALL_SERVICE, ...)
//!     → validation.rs (semantic checks)
//!     → TraceConfig (validated, immutable)
//!     → passed into HttpServer::new at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; request handling never touches the environment
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{from_env, from_lookup, ConfigError};
pub use schema::TraceConfig;
pub use schema::{DownstreamConfig, IdentityConfig, IpMode, ListenerConfig, ObservabilityConfig, TlsConfig};
