//! Trace context store.
//!
//! # Responsibilities
//! - Bind a trace id to one logical flow (closure or future)
//! - Answer "which trace id is current?" from anywhere inside that flow
//! - Carry the process-wide trace settings (enabled, generator, context key)
//!
//! # Design Decisions
//! - `tokio::task_local!` is the propagation primitive: a scope survives every
//!   `.await` of the future it wraps and is invisible to other tasks
//! - Spawned tasks do not inherit task-locals; `spawn`/`bind_current` carry the
//!   current context across explicitly
//! - Settings live in an `ArcSwap` (read per log line, written at startup or on
//!   reload); the enabled flag is a separate atomic
//! - Nothing here panics on misuse: unbound reads are `None`, unbound writes
//!   are dropped

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::task_local;

use crate::trace::context::{Metadata, TraceContext};
use crate::trace::generator::Generator;

/// Field name used for the trace id in emitted log entries.
pub const DEFAULT_CONTEXT_KEY: &str = "traceId";

task_local! {
    static CURRENT: Option<Arc<TraceContext>>;
}

/// Partial update for the store settings. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TraceIdOptions {
    pub enabled: Option<bool>,
    pub generator: Option<Generator>,
    pub context_key: Option<String>,
}

#[derive(Debug, Clone)]
struct Settings {
    generator: Generator,
    context_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generator: Generator::default(),
            context_key: DEFAULT_CONTEXT_KEY.to_string(),
        }
    }
}

/// Process-wide trace context store.
///
/// Construct once at startup and share as `Arc<TraceStore>` with the
/// middleware and every logger.
#[derive(Debug)]
pub struct TraceStore {
    enabled: AtomicBool,
    settings: ArcSwap<Settings>,
}

impl TraceStore {
    /// Create an enabled store with the default generator and context key.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            settings: ArcSwap::from_pointee(Settings::default()),
        }
    }

    /// Create a store and apply `options` on top of the defaults.
    pub fn with_options(options: TraceIdOptions) -> Self {
        let store = Self::new();
        store.configure(options);
        store
    }

    /// Merge `options` into the current settings. Last write wins per field.
    pub fn configure(&self, options: TraceIdOptions) {
        if let Some(enabled) = options.enabled {
            self.enabled.store(enabled, Ordering::SeqCst);
        }

        if options.generator.is_none() && options.context_key.is_none() {
            return;
        }

        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            if let Some(generator) = &options.generator {
                next.generator = generator.clone();
            }
            if let Some(key) = &options.context_key {
                next.context_key = key.clone();
            }
            next
        });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Name under which the trace id appears in log payloads.
    pub fn context_key(&self) -> String {
        self.settings.load().context_key.clone()
    }

    /// Produce a fresh id from the configured generator. Binds nothing.
    pub fn generate_trace_id(&self) -> String {
        self.settings.load().generator.generate()
    }

    /// Run `f` with `trace_id` bound for its extent and return its output.
    ///
    /// When the store is disabled (or the id is empty) `f` runs unbound.
    pub fn run_with_trace_id<F, R>(&self, trace_id: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.run_with_context(TraceContext::new(trace_id), f)
    }

    /// Like [`run_with_trace_id`](Self::run_with_trace_id) with a prepared
    /// context, e.g. one seeded with metadata.
    pub fn run_with_context<F, R>(&self, context: TraceContext, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.should_bind(&context) {
            return f();
        }
        CURRENT.sync_scope(Some(Arc::new(context)), f)
    }

    /// Generate an id, then run `f` bound to it.
    pub fn run_with_new_trace_id<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let trace_id = self.generate_trace_id();
        self.run_with_trace_id(trace_id, f)
    }

    /// Drive `fut` to completion with `trace_id` bound across all of its
    /// suspension points. The output (including any `Err`) is returned as is.
    pub async fn run_with_trace_id_async<Fut>(&self, trace_id: impl Into<String>, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        self.run_with_context_async(TraceContext::new(trace_id), fut).await
    }

    pub async fn run_with_context_async<Fut>(&self, context: TraceContext, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        if !self.should_bind(&context) {
            return fut.await;
        }
        CURRENT.scope(Some(Arc::new(context)), fut).await
    }

    pub async fn run_with_new_trace_id_async<Fut>(&self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        let trace_id = self.generate_trace_id();
        self.run_with_trace_id_async(trace_id, fut).await
    }

    /// Wrap `fut` so it runs inside the caller's current context, wherever it
    /// is eventually polled.
    pub fn bind_current<Fut>(&self, fut: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future,
    {
        CURRENT.scope(self.current_context(), fut)
    }

    /// `tokio::spawn` that carries the current context into the new task.
    pub fn spawn<Fut>(&self, fut: Fut) -> JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        tokio::spawn(self.bind_current(fut))
    }

    pub fn current_context(&self) -> Option<Arc<TraceContext>> {
        if !self.is_enabled() {
            return None;
        }
        CURRENT.try_with(|current| current.clone()).ok().flatten()
    }

    pub fn current_trace_id(&self) -> Option<String> {
        self.current_context().map(|ctx| ctx.trace_id().to_string())
    }

    /// Time since the current context was bound.
    pub fn elapsed(&self) -> Option<Duration> {
        self.current_context().map(|ctx| ctx.elapsed())
    }

    /// Set a metadata entry on the current context. No-op when unbound.
    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(ctx) = self.current_context() {
            ctx.set(key.into(), value.into());
        }
    }

    pub fn get_metadata(&self, key: &str) -> Option<Value> {
        self.current_context().and_then(|ctx| ctx.get(key))
    }

    /// Copy of the whole metadata bag of the current context.
    pub fn metadata(&self) -> Option<Metadata> {
        self.current_context().map(|ctx| ctx.snapshot())
    }

    fn should_bind(&self, context: &TraceContext) -> bool {
        self.is_enabled() && !context.trace_id().is_empty()
    }
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new()
    }
}
