//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Internal diagnostics (startup, reload, middleware fallbacks)
//!     → tracing macros
//!     → logging.rs (registry + EnvFilter + fmt layer)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Diagnostics are separate from application log entries, which go through
//!   the `logger` facade
//! - Structured fields, JSON output optional

pub mod logging;

pub use logging::init_subscriber;
