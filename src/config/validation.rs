//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address {0:?} is not a valid socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("logging.filter must not be empty")]
    EmptyLogFilter,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.server.bind_address.clone(),
        ));
    }

    let timeouts = [
        ("server.read_timeout_secs", config.server.read_timeout_secs),
        ("server.write_timeout_secs", config.server.write_timeout_secs),
        ("server.idle_timeout_secs", config.server.idle_timeout_secs),
        ("lifecycle.start_timeout_secs", config.lifecycle.start_timeout_secs),
        ("lifecycle.stop_timeout_secs", config.lifecycle.stop_timeout_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if config.logging.filter.trim().is_empty() {
        errors.push(ValidationError::EmptyLogFilter);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_ipv6_bind_address_is_valid() {
        let mut config = ServiceConfig::default();
        config.server.bind_address = "[::]:8080".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServiceConfig::default();
        config.server.bind_address = ":8080".into();
        config.server.read_timeout_secs = 0;
        config.lifecycle.stop_timeout_secs = 0;
        config.logging.filter = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress(":8080".into()),
                ValidationError::ZeroTimeout("server.read_timeout_secs"),
                ValidationError::ZeroTimeout("lifecycle.stop_timeout_secs"),
                ValidationError::EmptyLogFilter,
            ]
        );
    }
}
