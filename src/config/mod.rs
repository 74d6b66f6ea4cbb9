//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → trace settings pushed into the shared TraceStore
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → TraceStore::configure (last write wins)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - `trace_id` accepts a bool or a table and is normalized on load
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, HttpLoggingConfig, LoggerConfig, ObservabilityConfig, ServerConfig, TraceIdConfig};
pub use validation::ValidationError;
