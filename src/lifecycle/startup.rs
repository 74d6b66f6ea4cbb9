//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the process-wide TraceStore and the root Logger
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Nothing global: callers receive the assembled services and pass them on

use std::path::Path;
use std::sync::Arc;

use crate::config::{load_config, validation::validate_config, AppConfig, ConfigError};
use crate::logger::{Logger, LoggerError};
use crate::trace::TraceStore;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logger(#[from] LoggerError),
}

/// Services shared by the HTTP layer and application code.
#[derive(Debug, Clone)]
pub struct Services {
    pub config: AppConfig,
    pub store: Arc<TraceStore>,
    pub logger: Logger,
}

impl Services {
    /// Assemble services from a validated config.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let store = Arc::new(TraceStore::with_options(config.trace_id.to_options()));
        let logger = Logger::from_config(&config.app_name, &config.logger, store.clone())?;

        tracing::info!(
            app_name = %config.app_name,
            backend = %config.logger.backend,
            trace_enabled = store.is_enabled(),
            "Services initialized"
        );

        Ok(Self { config, store, logger })
    }

    /// Load `path` (or defaults when `None`) and assemble services.
    pub fn load(path: Option<&Path>) -> Result<Self, StartupError> {
        let config = match path {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };
        Self::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_assemble() {
        let services = Services::load(None).unwrap();
        assert!(services.store.is_enabled());
        assert_eq!(services.logger.app_name(), "trace-logger");
    }

    #[test]
    fn test_disabled_trace_id() {
        let mut config = AppConfig::default();
        config.trace_id.enabled = false;
        let services = Services::from_config(config).unwrap();
        assert!(!services.store.is_enabled());
    }

    #[test]
    fn test_unsupported_backend_is_fatal() {
        let mut config = AppConfig::default();
        config.logger.backend = "pino".into();
        assert!(matches!(
            Services::from_config(config),
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }
}
