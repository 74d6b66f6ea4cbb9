//! Backend adapter seam.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::logger::entry::LogEntry;
use crate::logger::json::JsonBackend;
use crate::logger::tracing_backend::TracingBackend;
use crate::logger::LoggerError;

/// Writes finished entries somewhere.
///
/// `context_key` is the field name the trace id must be emitted under.
pub trait LogBackend: Send + Sync {
    fn write(&self, entry: &LogEntry, context_key: &str);

    /// Flush buffered output, if any.
    fn flush(&self) {}
}

/// Backends selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON lines on stdout.
    #[default]
    Json,
    /// Events forwarded to the installed `tracing` subscriber.
    Tracing,
}

impl BackendKind {
    pub fn build(self) -> Arc<dyn LogBackend> {
        match self {
            BackendKind::Json => Arc::new(JsonBackend::stdout()),
            BackendKind::Tracing => Arc::new(TracingBackend),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Json => f.write_str("json"),
            BackendKind::Tracing => f.write_str("tracing"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(BackendKind::Json),
            "tracing" => Ok(BackendKind::Tracing),
            _ => Err(LoggerError::UnsupportedBackend(s.to_string())),
        }
    }
}
