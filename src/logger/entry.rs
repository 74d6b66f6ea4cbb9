//! Log entry model.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logger::LoggerError;

/// Severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(LoggerError::UnknownLevel(s.to_string())),
        }
    }
}

/// Display form of an error attached to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    /// Rendered `source()` chain, outermost first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            name: error_name::<E>(),
            message: err.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }
}

// Last path segment of the concrete type, generics stripped. Trait objects
// carry no concrete name.
fn error_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    if full.starts_with("dyn ") {
        return "Error".to_string();
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// One emitted log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub app_name: String,
    pub trace_id: Option<String>,
    pub message: String,
    pub payload: Option<Value>,
    pub context: Option<String>,
    pub error: Option<ErrorInfo>,
}

impl LogEntry {
    pub fn new(level: LogLevel, app_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            app_name: app_name.into(),
            trace_id: None,
            message: message.into(),
            payload: None,
            context: None,
            error: None,
        }
    }

    /// RFC 3339 timestamp with millisecond precision.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Render the entry as a JSON object, with the trace id under
    /// `context_key`. Absent fields are omitted.
    pub fn to_json(&self, context_key: &str) -> Value {
        let mut obj = Map::new();
        obj.insert("timestamp".into(), Value::String(self.timestamp_string()));
        obj.insert("level".into(), Value::String(self.level.as_str().into()));
        obj.insert("appName".into(), Value::String(self.app_name.clone()));
        if let Some(trace_id) = &self.trace_id {
            obj.insert(context_key.to_string(), Value::String(trace_id.clone()));
        }
        obj.insert("message".into(), Value::String(self.message.clone()));
        if let Some(payload) = &self.payload {
            obj.insert("payload".into(), payload.clone());
        }
        if let Some(context) = &self.context {
            obj.insert("context".into(), Value::String(context.clone()));
        }
        if let Some(error) = &self.error {
            obj.insert("error".into(), serde_json::to_value(error).unwrap_or(Value::Null));
        }
        Value::Object(obj)
    }
}
