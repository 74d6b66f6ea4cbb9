//! Logger facade.
//!
//! # Responsibilities
//! - Build `LogEntry` values (timestamp, app name, context, payload, error)
//! - Stamp the current trace id from the shared `TraceStore`
//! - Drop entries below the configured minimum level
//! - Hand finished entries to the selected backend

use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::Value;

use crate::config::LoggerConfig;
use crate::logger::backend::{BackendKind, LogBackend};
use crate::logger::entry::{ErrorInfo, LogEntry, LogLevel};
use crate::logger::LoggerError;
use crate::trace::TraceStore;

/// Application logger. Cheap to clone; clones share backend and store.
#[derive(Clone)]
pub struct Logger {
    app_name: Arc<str>,
    min_level: LogLevel,
    context: Option<Arc<str>>,
    backend: Arc<dyn LogBackend>,
    store: Arc<TraceStore>,
}

impl Logger {
    pub fn new(
        app_name: impl Into<String>,
        min_level: LogLevel,
        backend: Arc<dyn LogBackend>,
        store: Arc<TraceStore>,
    ) -> Self {
        Self {
            app_name: Arc::from(app_name.into()),
            min_level,
            context: None,
            backend,
            store,
        }
    }

    /// Build a logger from configuration.
    ///
    /// Fails on an unsupported backend name or an unknown level.
    pub fn from_config(
        app_name: &str,
        config: &LoggerConfig,
        store: Arc<TraceStore>,
    ) -> Result<Self, LoggerError> {
        let kind: BackendKind = config.backend.parse()?;
        let level: LogLevel = config.level.parse()?;
        Ok(Self::new(app_name, level, kind.build(), store))
    }

    /// Child logger tagging every entry with `context` (e.g. a component name).
    pub fn with_context(&self, context: impl Into<String>) -> Self {
        Self {
            context: Some(Arc::from(context.into())),
            ..self.clone()
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn store(&self) -> &Arc<TraceStore> {
        &self.store
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, payload: Option<Value>) {
        if !self.is_enabled_for(level) {
            return;
        }
        let mut entry = self.entry(level, message);
        entry.payload = payload;
        self.emit(entry);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message, None);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message, None);
    }

    /// Log at `error` with the error's name, message and cause chain attached.
    pub fn error_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: StdError + ?Sized,
    {
        if !self.is_enabled_for(LogLevel::Error) {
            return;
        }
        let mut entry = self.entry(LogLevel::Error, message);
        entry.error = Some(ErrorInfo::from_error(err));
        self.emit(entry);
    }

    pub fn flush(&self) {
        self.backend.flush();
    }

    fn entry(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let mut entry = LogEntry::new(level, self.app_name.as_ref(), message);
        entry.trace_id = self.store.current_trace_id();
        entry.context = self.context.as_deref().map(str::to_string);
        entry
    }

    fn emit(&self, entry: LogEntry) {
        self.backend.write(&entry, &self.store.context_key());
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.app_name)
            .field("min_level", &self.min_level)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
