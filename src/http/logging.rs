//! Request/response logging middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::config::HttpLoggingConfig;
use crate::logger::{LogLevel, Logger};

/// State for [`request_logging_middleware`].
#[derive(Clone)]
pub struct RequestLoggingState {
    logger: Logger,
    exclude_paths: Vec<String>,
}

impl RequestLoggingState {
    pub fn new(logger: &Logger, config: &HttpLoggingConfig) -> Self {
        Self {
            logger: logger.with_context("HTTP"),
            exclude_paths: config.exclude_paths.clone(),
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| p == path)
    }
}

/// Level for the completion entry.
pub fn level_for_status(status: StatusCode) -> LogLevel {
    if status.is_server_error() {
        LogLevel::Error
    } else if status.is_client_error() {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

/// Logs "Incoming request" before and "Request completed" after the handler.
///
/// Placed inside the trace middleware, both entries carry the request's id.
pub async fn request_logging_middleware(
    State(state): State<RequestLoggingState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if state.is_excluded(&path) {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().clone();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.logger.log(
        LogLevel::Info,
        "Incoming request",
        Some(json!({
            "method": method.as_str(),
            "path": path,
            "query": req.uri().query(),
            "userAgent": user_agent,
        })),
    );

    let response = next.run(req).await;
    let status = response.status();

    state.logger.log(
        level_for_status(status),
        "Request completed",
        Some(json!({
            "method": method.as_str(),
            "path": path,
            "statusCode": status.as_u16(),
            "durationMs": start.elapsed().as_millis() as u64,
        })),
    );

    response
}
