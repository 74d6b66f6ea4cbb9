//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::trace::extractor::{one_or_many, ExtractorConfig, MIDDLEWARE_DEFAULT_HEADERS};
use crate::trace::store::DEFAULT_CONTEXT_KEY;
use crate::trace::{GeneratorKind, TraceIdOptions};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name stamped on every log entry as `appName`.
    pub app_name: String,

    /// HTTP listener settings for the bundled service.
    pub server: ServerConfig,

    /// Logger facade settings.
    pub logger: LoggerConfig,

    /// Trace id propagation (`true`, `false` or a table).
    pub trace_id: TraceIdConfig,

    /// Where the middleware looks for an upstream trace id. Fields left out
    /// of the table keep the middleware defaults.
    #[serde(deserialize_with = "middleware_extractor")]
    pub extractor: ExtractorConfig,

    /// Request/response logging middleware.
    pub http_logging: HttpLoggingConfig,

    /// Diagnostics subscriber settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "trace-logger".to_string(),
            server: ServerConfig::default(),
            logger: LoggerConfig::default(),
            trace_id: TraceIdConfig::default(),
            extractor: ExtractorConfig::middleware_default(),
            http_logging: HttpLoggingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Extractor settings the middleware should use. A non-empty
    /// `trace_id.header` list replaces the extractor's header list.
    pub fn effective_extractor(&self) -> ExtractorConfig {
        let mut extractor = self.extractor.clone();
        if !self.trace_id.header.is_empty() {
            extractor.header = self.trace_id.header.clone();
        }
        extractor
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Largest JSON body the trace middleware buffers to look for an id.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Logger facade configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Backend name: "json" or "tracing".
    pub backend: String,

    /// Minimum level (trace, debug, info, warn, error, fatal).
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Trace id settings in normalized form.
///
/// Accepts `trace_id = false`, `trace_id = true`, or a table:
/// ```toml
/// [trace_id]
/// enabled = true
/// generator = "uuid-simple"
/// header = ["x-b3-traceid", "x-trace-id"]
/// context_key = "requestId"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "TraceIdSetting")]
pub struct TraceIdConfig {
    pub enabled: bool,
    pub generator: GeneratorKind,
    /// Header names to probe; empty keeps the extractor's list.
    pub header: Vec<String>,
    /// Field name of the trace id in log entries.
    pub context_key: String,
    /// Response header echoing the id; empty disables the echo.
    pub response_header: String,
}

impl Default for TraceIdConfig {
    fn default() -> Self {
        TraceIdTable::default().into()
    }
}

impl TraceIdConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Store options equivalent to this config.
    pub fn to_options(&self) -> TraceIdOptions {
        TraceIdOptions {
            enabled: Some(self.enabled),
            generator: Some(self.generator.into()),
            context_key: Some(self.context_key.clone()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceIdSetting {
    Flag(bool),
    Table(TraceIdTable),
}

#[derive(Deserialize)]
#[serde(default)]
struct TraceIdTable {
    enabled: bool,
    generator: GeneratorKind,
    #[serde(deserialize_with = "one_or_many")]
    header: Vec<String>,
    context_key: String,
    response_header: String,
}

impl Default for TraceIdTable {
    fn default() -> Self {
        Self {
            enabled: true,
            generator: GeneratorKind::default(),
            header: Vec::new(),
            context_key: DEFAULT_CONTEXT_KEY.to_string(),
            response_header: "x-trace-id".to_string(),
        }
    }
}

impl From<TraceIdTable> for TraceIdConfig {
    fn from(table: TraceIdTable) -> Self {
        Self {
            enabled: table.enabled,
            generator: table.generator,
            header: table.header,
            context_key: table.context_key,
            response_header: table.response_header,
        }
    }
}

impl From<TraceIdSetting> for TraceIdConfig {
    fn from(setting: TraceIdSetting) -> Self {
        match setting {
            TraceIdSetting::Flag(enabled) => TraceIdConfig {
                enabled,
                ..TraceIdConfig::default()
            },
            TraceIdSetting::Table(table) => table.into(),
        }
    }
}

// `[extractor]` as written in a config file. Unlike `ExtractorConfig`'s own
// default, a missing `header` means the middleware's five-name set.
#[derive(Deserialize)]
struct ExtractorTable {
    #[serde(default = "middleware_headers", deserialize_with = "one_or_many")]
    header: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    query: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    body: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    params: Vec<String>,
}

fn middleware_headers() -> Vec<String> {
    ExtractorConfig::middleware_default().header
}

fn middleware_extractor<'de, D>(deserializer: D) -> Result<ExtractorConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let table = ExtractorTable::deserialize(deserializer)?;
    Ok(ExtractorConfig {
        header: table.header,
        query: table.query,
        body: table.body,
        params: table.params,
    })
}

/// Request/response logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpLoggingConfig {
    /// Log one entry per request and one per response.
    pub enabled: bool,

    /// Paths that are never logged (exact match).
    pub exclude_paths: Vec<String>,
}

impl Default for HttpLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_paths: vec!["/health".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter for internal diagnostics when RUST_LOG is unset.
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_accepts_bool() {
        let config: AppConfig = toml::from_str("trace_id = false").unwrap();
        assert!(!config.trace_id.enabled);
        assert_eq!(config.trace_id.context_key, "traceId");

        let config: AppConfig = toml::from_str("trace_id = true").unwrap();
        assert!(config.trace_id.enabled);
    }

    #[test]
    fn test_trace_id_accepts_table() {
        let config: AppConfig = toml::from_str(
            r#"
            [trace_id]
            generator = "uuid-simple"
            header = "x-b3-traceid"
            context_key = "requestId"
            "#,
        )
        .unwrap();
        assert!(config.trace_id.enabled);
        assert_eq!(config.trace_id.generator, GeneratorKind::UuidSimple);
        assert_eq!(config.trace_id.header, vec!["x-b3-traceid"]);
        assert_eq!(config.trace_id.context_key, "requestId");
        assert_eq!(config.trace_id.response_header, "x-trace-id");
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.app_name, "trace-logger");
        assert_eq!(config.logger.backend, "json");
        assert!(config.trace_id.enabled);
        assert_eq!(config.extractor.header.len(), 5);
        assert_eq!(config.http_logging.exclude_paths, vec!["/health"]);
    }

    #[test]
    fn test_partial_extractor_keeps_middleware_headers() {
        let config: AppConfig = toml::from_str(
            r#"
            [extractor]
            query = "traceId"
            "#,
        )
        .unwrap();
        let extractor = config.effective_extractor();
        assert_eq!(extractor.header, MIDDLEWARE_DEFAULT_HEADERS);
        assert_eq!(extractor.query, vec!["traceId"]);
        assert_eq!(extractor.header, AppConfig::default().extractor.header);

        // An explicit empty list still turns header probing off.
        let config: AppConfig = toml::from_str("[extractor]\nheader = []").unwrap();
        assert!(config.extractor.header.is_empty());
    }

    #[test]
    fn test_header_override() {
        let config: AppConfig = toml::from_str(
            r#"
            [trace_id]
            header = ["x-custom"]

            [extractor]
            query = "traceId"
            "#,
        )
        .unwrap();
        let extractor = config.effective_extractor();
        assert_eq!(extractor.header, vec!["x-custom"]);
        assert_eq!(extractor.query, vec!["traceId"]);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = AppConfig::default();
        config.trace_id = TraceIdConfig::disabled();
        let text = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.trace_id, config.trace_id);
    }
}
