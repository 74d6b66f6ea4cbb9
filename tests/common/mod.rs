//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use trace_logger::logger::JsonBackend;
use trace_logger::{LogLevel, Logger, TraceStore};

/// In-memory sink for the JSON backend.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Every line written so far, parsed as JSON.
    pub fn entries(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Entries whose message equals `message`.
    #[allow(dead_code)]
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.entries()
            .into_iter()
            .filter(|e| e["message"] == message)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A JSON logger writing into a fresh buffer, sharing `store`.
pub fn capture_logger(store: Arc<TraceStore>) -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let backend = Arc::new(JsonBackend::new(buffer.clone()));
    let logger = Logger::new("test-app", LogLevel::Trace, backend, store);
    (logger, buffer)
}
