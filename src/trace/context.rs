//! Per-flow trace context.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Free-form metadata attached to a flow.
pub type Metadata = HashMap<String, Value>;

/// State bound to one logical execution flow.
///
/// Created when a flow is bound and dropped when the bound closure or future
/// completes. Metadata is only reachable through the store from inside the
/// same flow.
#[derive(Debug)]
pub struct TraceContext {
    trace_id: String,
    start: Instant,
    started_at: DateTime<Utc>,
    metadata: Mutex<Metadata>,
}

impl TraceContext {
    /// Create a context starting now with empty metadata.
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            start: Instant::now(),
            started_at: Utc::now(),
            metadata: Mutex::new(Metadata::new()),
        }
    }

    /// Seed the metadata bag.
    pub fn with_metadata(self, metadata: Metadata) -> Self {
        *lock(&self.metadata) = metadata;
        self
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Wall-clock creation time.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the context was created (monotonic clock).
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub(crate) fn set(&self, key: String, value: Value) {
        lock(&self.metadata).insert(key, value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        lock(&self.metadata).get(key).cloned()
    }

    pub(crate) fn snapshot(&self) -> Metadata {
        lock(&self.metadata).clone()
    }
}

// A panic while holding the lock leaves the map intact; keep serving it.
fn lock(metadata: &Mutex<Metadata>) -> MutexGuard<'_, Metadata> {
    metadata.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_metadata() {
        let mut seed = Metadata::new();
        seed.insert("user".into(), json!("alice"));
        let ctx = TraceContext::new("abc").with_metadata(seed);

        assert_eq!(ctx.trace_id(), "abc");
        assert_eq!(ctx.get("user"), Some(json!("alice")));
        assert_eq!(ctx.get("missing"), None);

        ctx.set("attempt".into(), json!(2));
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["attempt"], json!(2));
    }

    #[test]
    fn test_context_elapsed_grows() {
        let ctx = TraceContext::new("abc");
        let first = ctx.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= first);
        assert!(ctx.started_at() <= Utc::now());
    }
}
