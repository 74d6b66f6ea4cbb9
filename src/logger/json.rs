//! JSON-lines backend.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::logger::backend::LogBackend;
use crate::logger::entry::LogEntry;

/// Writes each entry as one JSON object per line.
pub struct JsonBackend {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonBackend {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl LogBackend for JsonBackend {
    fn write(&self, entry: &LogEntry, context_key: &str) {
        let line = entry.to_json(context_key).to_string();
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{}", line) {
            tracing::error!(error = %e, "Failed to write log entry");
        }
    }

    fn flush(&self) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.flush() {
            tracing::error!(error = %e, "Failed to flush log sink");
        }
    }
}
