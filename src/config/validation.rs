//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject unsupported logger backends and unknown levels up front
//! - Check header names are valid HTTP header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::AppConfig;
use crate::logger::{BackendKind, LogLevel};

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("app_name must not be empty")]
    EmptyAppName,

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("unsupported logger backend '{0}'")]
    UnsupportedBackend(String),

    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    #[error("unknown log format '{0}' (expected 'pretty' or 'json')")]
    UnknownLogFormat(String),

    #[error("trace_id.context_key must not be empty")]
    EmptyContextKey,

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("empty field name in extractor.{0}")]
    EmptyFieldName(&'static str),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app_name.trim().is_empty() {
        errors.push(ValidationError::EmptyAppName);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.logger.backend.parse::<BackendKind>().is_err() {
        errors.push(ValidationError::UnsupportedBackend(config.logger.backend.clone()));
    }

    if config.logger.level.parse::<LogLevel>().is_err() {
        errors.push(ValidationError::UnknownLevel(config.logger.level.clone()));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(config.observability.log_format.clone()));
    }

    if config.trace_id.context_key.is_empty() {
        errors.push(ValidationError::EmptyContextKey);
    }

    let response_header = &config.trace_id.response_header;
    if !response_header.is_empty() && HeaderName::try_from(response_header.as_str()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(response_header.clone()));
    }

    let extractor = config.effective_extractor();
    for name in &extractor.header {
        if HeaderName::try_from(name.as_str()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    for (location, names) in [
        ("query", &extractor.query),
        ("body", &extractor.body),
        ("params", &extractor.params),
    ] {
        if names.iter().any(|n| n.is_empty()) {
            errors.push(ValidationError::EmptyFieldName(location));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
