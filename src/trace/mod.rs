//! Trace context subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request view
//!     → extractor.rs (headers → query → body → params, first match wins)
//!     → generator.rs (fallback id when nothing was extracted)
//!     → store.rs (bind id to the current task for the flow's extent)
//!     → context.rs (TraceContext readable by any code inside the flow)
//! ```
//!
//! # Design Decisions
//! - Binding uses `tokio::task_local!`, so concurrent flows are isolated even
//!   when they interleave on the same worker thread
//! - The store is an explicit service object shared via `Arc`, not a global
//! - Extraction is strict: only non-empty strings count as trace ids

pub mod context;
pub mod extractor;
pub mod generator;
pub mod store;

pub use context::{Metadata, TraceContext};
pub use extractor::{ExtractorConfig, RequestLike, RequestView, RouteParams, TraceIdExtractor};
pub use generator::{Generator, GeneratorKind};
pub use store::{TraceIdOptions, TraceStore};
