//! Trace ID middleware.
//!
//! # Responsibilities
//! - Resolve a trace id for each request (extract, else generate)
//! - Run the rest of the chain inside a store scope bound to that id
//! - Echo the id on the response
//!
//! # Design Decisions
//! - Must be added with `Router::layer` so route params are already matched
//! - Setup failures never fail the request: they are logged and the chain
//!   runs unbound
//! - Handler errors and responses pass through untouched

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::http::request::{buffer_json_body, header_fields, query_fields, route_params, X_TRACE_ID};
use crate::trace::extractor::RouteParams;
use crate::trace::{ExtractorConfig, Generator, RequestView, TraceIdExtractor, TraceStore};

/// Shared state for [`trace_id_middleware`].
#[derive(Clone)]
pub struct TraceMiddlewareState {
    store: Arc<TraceStore>,
    extractor: Arc<TraceIdExtractor>,
    generator: Option<Generator>,
    generate_missing: bool,
    response_header: Option<HeaderName>,
    max_body_bytes: usize,
}

impl TraceMiddlewareState {
    /// Middleware defaults: five probed headers, ids generated by the store
    /// when none is found, echoed as `x-trace-id`.
    pub fn new(store: Arc<TraceStore>) -> Self {
        Self {
            store,
            extractor: Arc::new(TraceIdExtractor::new(ExtractorConfig::middleware_default())),
            generator: None,
            generate_missing: true,
            response_header: Some(HeaderName::from_static(X_TRACE_ID)),
            max_body_bytes: 64 * 1024,
        }
    }

    pub fn from_config(store: Arc<TraceStore>, config: &AppConfig) -> Self {
        let response_header = match config.trace_id.response_header.as_str() {
            "" => None,
            name => HeaderName::try_from(name).ok(),
        };
        Self {
            extractor: Arc::new(TraceIdExtractor::new(config.effective_extractor())),
            response_header,
            max_body_bytes: config.server.max_body_bytes,
            ..Self::new(store)
        }
    }

    pub fn with_extractor(mut self, config: ExtractorConfig) -> Self {
        self.extractor = Arc::new(TraceIdExtractor::new(config));
        self
    }

    /// Use `generator` instead of the store's generator for missing ids.
    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = Some(generator);
        self.generate_missing = true;
        self
    }

    /// Leave requests without an upstream id unbound.
    pub fn without_generation(mut self) -> Self {
        self.generator = None;
        self.generate_missing = false;
        self
    }

    pub fn with_response_header(mut self, name: Option<HeaderName>) -> Self {
        self.response_header = name;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    fn resolve(&self, view: &RequestView) -> Option<String> {
        if let Some(id) = self.extractor.extract_from_request(view) {
            return Some(id);
        }
        if !self.generate_missing {
            return None;
        }
        let id = match &self.generator {
            Some(generator) => generator.generate(),
            None => self.store.generate_trace_id(),
        };
        (!id.is_empty()).then_some(id)
    }
}

pub async fn trace_id_middleware(
    State(state): State<TraceMiddlewareState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // 1. Tracing off: pass through untouched.
    if !state.store.is_enabled() {
        return next.run(req).await;
    }

    // 2. Build the request view.
    let (mut parts, body) = req.into_parts();
    let params = route_params(&mut parts).await;
    let (body, json) = buffer_json_body(&parts.headers, body, state.max_body_bytes).await;

    // 3-4. Extract or generate. A panic here must not take the request down.
    let resolved = catch_unwind(AssertUnwindSafe(|| {
        let view = RequestView {
            headers: header_fields(&parts.headers),
            query: query_fields(parts.uri.query()),
            body: json,
            params: RouteParams::into_fields(params),
        };
        state.resolve(&view)
    }));

    let req = Request::from_parts(parts, body);
    let trace_id = match resolved {
        Ok(Some(id)) => id,
        Ok(None) => return next.run(req).await,
        Err(_) => {
            tracing::warn!(path = %req.uri().path(), "Trace id setup failed; continuing without trace id");
            return next.run(req).await;
        }
    };

    // 5. Run the chain bound to the id.
    let span = tracing::info_span!("request", trace_id = %trace_id);
    let mut response = state
        .store
        .run_with_trace_id_async(trace_id.clone(), next.run(req).instrument(span))
        .await;

    if let Some(name) = &state.response_header {
        match HeaderValue::from_str(&trace_id) {
            Ok(value) => {
                response.headers_mut().insert(name.clone(), value);
            }
            Err(_) => tracing::debug!(trace_id = %trace_id, "Trace id is not a valid header value"),
        }
    }

    response
}
