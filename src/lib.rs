//! Trace-aware logging facade.
//!
//! One `Logger` interface over two backends, with every entry stamped by the
//! trace id of the request flow it was written from, plus axum middleware that
//! resolves that id per request.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod logger;
pub mod observability;
pub mod trace;

pub use config::AppConfig;
pub use http::AppServer;
pub use lifecycle::{Services, Shutdown};
pub use logger::{LogLevel, Logger};
pub use trace::{TraceIdExtractor, TraceStore};
