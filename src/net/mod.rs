//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (port, ip_mode, tls)
//!     → listener.rs (choose family, bind socket)
//!     → tls.rs (optional: load certificates)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Binding happens before the runtime serves traffic; failure is fatal
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;

pub use listener::{Listener, ListenerError};
