//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide `tracing` subscriber exactly once
//! - Hand out named sub-loggers so each component's events carry its name
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Filter priority: CLI flag > RUST_LOG > config file > built-in default
//! - A [`Logger`] is a span; components attach it to their work with
//!   `Instrument` instead of holding a global handle

use thiserror::Error;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Failure to bring up the logging backend.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to install global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Handle to a named component logger.
///
/// Cheap to clone. Events emitted inside [`Logger::span`] are tagged with the
/// component name of every ancestor logger.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
    component: &'static str,
}

impl Logger {
    /// The root logger all component loggers descend from.
    pub fn root() -> Self {
        Self {
            span: tracing::info_span!("healthz"),
            component: "healthz",
        }
    }

    /// Create a child logger for `component`.
    pub fn named(&self, component: &'static str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "component", name = component),
            component,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

/// Pick the filter directive: CLI override, then `RUST_LOG`, then config.
pub fn filter_directive(cli_override: Option<&str>, config: &LoggingConfig) -> String {
    cli_override
        .map(str::to_owned)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.filter.clone())
}

/// Install the global subscriber and return the root logger.
///
/// Fails if `filter` does not parse or a global subscriber already exists.
pub fn init_logging(filter: &str, format: LogFormat) -> Result<Logger, LoggingError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|source| LoggingError::Filter {
        filter: filter.to_owned(),
        source,
    })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(Logger::root())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override_wins() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directive(Some("warn"), &config), "warn");
    }

    #[test]
    fn test_invalid_filter_is_init_error() {
        let err = init_logging("healthz=notalevel", LogFormat::Pretty).unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
    }

    #[test]
    fn test_named_logger_keeps_component() {
        let root = Logger::root();
        let child = root.named("HealthRoute");
        assert_eq!(root.component(), "healthz");
        assert_eq!(child.component(), "HealthRoute");
    }
}
