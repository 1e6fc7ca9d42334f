//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     Vec<Arc<dyn Route>>
//!     → router.rs (validate patterns, reject duplicates)
//!     → Freeze as axum::Router (one entry per pattern)
//!
//! Incoming Request (path)
//!     → exact path match
//!     → Route::handle, or axum's empty 404
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Static paths only, exact match
//! - Deterministic: duplicate patterns fail construction

pub mod route;
pub mod router;

pub use route::Route;
pub use router::{Router, RoutingError};
