//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(
            r#"
            app_name = "orders"

            [logger]
            backend = "tracing"
            level = "debug"

            [trace_id]
            context_key = "requestId"
            "#,
        )
        .unwrap();
        assert_eq!(config.app_name, "orders");
        assert_eq!(config.logger.backend, "tracing");
        assert_eq!(config.trace_id.context_key, "requestId");
    }

    #[test]
    fn test_unsupported_backend_is_fatal() {
        let err = parse_config("[logger]\nbackend = \"winston\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("winston"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("app_name = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("trace-logger-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "trace_id = false\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.trace_id.enabled);

        fs::remove_file(&path).unwrap_or_default();
    }
}
