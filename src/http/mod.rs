//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → middleware.rs (resolve trace id, bind scope, echo header)
//!         → request.rs (headers, query, JSON body, route params → RequestView)
//!     → logging.rs (request/response entries, stamped with the bound id)
//!     → handlers (any Logger call sees the same id)
//! ```

pub mod logging;
pub mod middleware;
pub mod request;
pub mod server;

pub use logging::{request_logging_middleware, RequestLoggingState};
pub use middleware::{trace_id_middleware, TraceMiddlewareState};
pub use request::X_TRACE_ID;
pub use server::{build_router, AppServer, AppState};
