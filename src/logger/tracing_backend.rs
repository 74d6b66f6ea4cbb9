//! Backend forwarding entries to the `tracing` pipeline.

use crate::logger::backend::LogBackend;
use crate::logger::entry::{LogEntry, LogLevel};

/// Emits every entry as a `tracing` event under the `trace_logger` target.
///
/// Formatting and output are left to whichever subscriber is installed.
///
/// `tracing` field names are fixed at compile time, so the trace id is always
/// recorded as `trace_id`. The configured context key travels alongside it in
/// the `context_key` field and is never used as the field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

macro_rules! emit {
    ($level:expr, $entry:expr, $key:expr, $fatal:expr) => {{
        let entry = $entry;
        let payload = entry.payload.as_ref().map(|p| p.to_string());
        let error = entry.error.as_ref().map(|e| e.message.as_str());
        let error_name = entry.error.as_ref().map(|e| e.name.as_str());
        tracing::event!(
            target: "trace_logger",
            $level,
            app_name = %entry.app_name,
            trace_id = entry.trace_id.as_deref(),
            context_key = $key,
            context = entry.context.as_deref(),
            payload = payload.as_deref(),
            error = error,
            error_name = error_name,
            fatal = $fatal,
            "{}",
            entry.message
        )
    }};
}

impl LogBackend for TracingBackend {
    fn write(&self, entry: &LogEntry, context_key: &str) {
        match entry.level {
            LogLevel::Trace => emit!(tracing::Level::TRACE, entry, context_key, false),
            LogLevel::Debug => emit!(tracing::Level::DEBUG, entry, context_key, false),
            LogLevel::Info => emit!(tracing::Level::INFO, entry, context_key, false),
            LogLevel::Warn => emit!(tracing::Level::WARN, entry, context_key, false),
            LogLevel::Error => emit!(tracing::Level::ERROR, entry, context_key, false),
            // tracing has no level above ERROR
            LogLevel::Fatal => emit!(tracing::Level::ERROR, entry, context_key, true),
        }
    }
}
