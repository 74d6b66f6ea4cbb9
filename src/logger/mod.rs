//! Logging facade.
//!
//! # Data Flow
//! ```text
//! application code
//!     → facade.rs (Logger: level filter, entry building)
//!         ← trace::TraceStore (current trace id, context key)
//!     → backend.rs (LogBackend trait, chosen by BackendKind)
//!         → json.rs (JSON lines on a writer)
//!         → tracing_backend.rs (tracing events)
//! ```
//!
//! # Design Decisions
//! - Backends are thin adapters; the facade owns the entry shape
//! - Backend choice is validated at construction, never at log time
//! - The trace id is read at entry-build time, so a logger created outside a
//!   request still stamps the id of whichever flow calls it

pub mod backend;
pub mod entry;
pub mod facade;
pub mod json;
pub mod tracing_backend;

pub use backend::{BackendKind, LogBackend};
pub use entry::{ErrorInfo, LogEntry, LogLevel};
pub use facade::Logger;
pub use json::JsonBackend;
pub use tracing_backend::TracingBackend;

/// Logger construction errors.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("unsupported logger backend '{0}' (expected 'json' or 'tracing')")]
    UnsupportedBackend(String),

    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
}
