//! Trace ID generators.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A function producing fresh trace ids.
#[derive(Clone)]
pub struct Generator(Arc<dyn Fn() -> String + Send + Sync>);

impl Generator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn generate(&self) -> String {
        (self.0)()
    }
}

impl Default for Generator {
    fn default() -> Self {
        GeneratorKind::Uuid.into()
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Generator(..)")
    }
}

/// Built-in generators selectable from config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum GeneratorKind {
    /// Hyphenated UUID v4 (36 chars).
    #[default]
    #[serde(rename = "uuid")]
    Uuid,
    /// UUID v4 without hyphens (32 hex chars).
    #[serde(rename = "uuid-simple")]
    UuidSimple,
}

impl From<GeneratorKind> for Generator {
    fn from(kind: GeneratorKind) -> Self {
        match kind {
            GeneratorKind::Uuid => Generator::new(|| Uuid::new_v4().to_string()),
            GeneratorKind::UuidSimple => Generator::new(|| Uuid::new_v4().simple().to_string()),
        }
    }
}
