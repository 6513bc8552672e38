//! Hop-chain tracing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → descriptor.rs (capture the local HopRecord)
//!     → aggregator.rs (terminus? respond with [self])
//!     → target.rs (normalize configured downstream into a URL)
//!     → invoker.rs (bounded GET, decode HopChain)
//!     → aggregator.rs (append self, or degrade to [self] + error)
//! ```
//!
//! # Design Decisions
//! - One record type on both sides of the wire, so responders compose
//! - Chains only grow at the end; downstream order is never touched
//! - Every downstream failure is contained in the request

pub mod aggregator;
pub mod descriptor;
pub mod error;
pub mod invoker;
pub mod record;
pub mod target;

pub use aggregator::{TraceOutcome, Tracer};
pub use descriptor::{RequestView, SelfDescriptor};
pub use error::TraceError;
pub use invoker::DownstreamClient;
pub use record::{HeaderSnapshot, HopChain, HopRecord};
pub use target::normalize_target;
