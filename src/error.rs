//! Top-level error type for assembling and running the service.

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::LifecycleError;
use crate::observability::LoggingError;
use crate::routing::RoutingError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("logging initialization failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}
