//! Health probe subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthz
//!     → routing dispatch table
//!     → liveness.rs (HealthRoute)
//!     → 200 "OK"
//! ```
//!
//! # Design Decisions
//! - Liveness only: if the process answers, it is alive
//! - Stateless handler, nothing to synchronize
//! - Method is not inspected

pub mod liveness;

pub use liveness::{HealthRoute, HEALTHY_BODY, HEALTHZ_PATH};
