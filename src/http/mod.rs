//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::listener)
//!     → server.rs (hyper HTTP/1.1, read/idle timeouts)
//!     → request.rs (assign request ID)
//!     → TraceLayer span, write timeout
//!     → routing dispatch table
//!     → Send to client (request ID echoed)
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
