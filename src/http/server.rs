//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (tower-http trace, trace id, request logging, timeout)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::logging::{request_logging_middleware, RequestLoggingState};
use crate::http::middleware::{trace_id_middleware, TraceMiddlewareState};
use crate::logger::Logger;
use crate::trace::TraceStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TraceStore>,
    pub logger: Logger,
}

/// HTTP server for the demo service.
pub struct AppServer {
    router: Router,
    config: AppConfig,
}

impl AppServer {
    pub fn new(config: AppConfig, store: Arc<TraceStore>, logger: Logger) -> Self {
        let router = build_router(&config, store, logger);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layer order (outer → inner): tower-http trace, trace id, request logging,
/// timeout. The request logger runs inside the trace scope.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, store: Arc<TraceStore>, logger: Logger) -> Router {
    let state = AppState {
        store: store.clone(),
        logger: logger.clone(),
    };
    let trace_state = TraceMiddlewareState::from_config(store, config);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/echo/{id}", get(echo_handler).post(echo_post_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));

    if config.http_logging.enabled {
        let logging_state = RequestLoggingState::new(&logger, &config.http_logging);
        router = router.layer(middleware::from_fn_with_state(logging_state, request_logging_middleware));
    }

    router
        .layer(middleware::from_fn_with_state(trace_state, trace_id_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Echo the path id together with the trace id the request was bound to.
async fn echo_handler(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let logger = state.logger.with_context("EchoHandler");
    logger.log(crate::logger::LogLevel::Info, "Echo requested", Some(json!({ "id": id })));

    Json(json!({
        "id": id,
        "traceId": state.store.current_trace_id(),
        "elapsedMs": state.store.elapsed().map(|d| d.as_millis() as u64),
    }))
}

/// Like [`echo_handler`], also logging from a spawned task to show the id
/// following the work across a task boundary.
async fn echo_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let logger = state.logger.with_context("EchoHandler");
    state.store.set_metadata("echoId", id.clone());

    let background = logger.clone();
    let task = state.store.spawn(async move {
        background.info("Background work finished");
    });
    if let Err(e) = task.await {
        logger.error_with("Background task failed", &e);
    }

    logger.log(crate::logger::LogLevel::Info, "Echo posted", Some(body.clone()));

    Json(json!({
        "id": id,
        "traceId": state.store.current_trace_id(),
        "body": body,
    }))
}
