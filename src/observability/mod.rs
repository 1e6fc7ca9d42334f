//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All components produce:
//!     → logging.rs (structured log events, one span per component)
//!     → request spans from tower-http's TraceLayer (http::server)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every request span
//! - No metrics or trace export

pub mod logging;

pub use logging::{init_logging, Logger, LoggingError};
