//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Hooks registered in dependency order → on_start each, in order
//!
//! Run:
//!     signals.rs (SIGTERM/SIGINT) or fatal.rs (background failure)
//!
//! Shutdown (coordinator.rs, shutdown.rs):
//!     on_stop each, in reverse order → background tasks observe Shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: a component starts only after everything it depends on
//! - Ordered shutdown: dependents are torn down before their dependencies
//! - Every hook has a deadline: a stuck hook cannot hang the process

pub mod coordinator;
pub mod fatal;
pub mod hooks;
pub mod shutdown;
pub mod signals;

pub use coordinator::{Lifecycle, LifecycleError, LifecycleState, StopFailure};
pub use fatal::{FatalError, FatalReporter};
pub use hooks::{Hook, HookContext, HookError};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::shutdown_signal;
