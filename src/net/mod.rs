//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept loop, transient error backoff)
//!     → connection.rs (id, open-connection count, idle tracking)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Idle ⇄ Active → Closed
//! ```
//!
//! # Design Decisions
//! - Bind errors are returned to the caller, never handled in a background task
//! - Each connection tracked so stop can wait for sockets to actually close

pub mod connection;
pub mod listener;

pub use connection::{Activity, ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError};
