//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so that running without a config file yields the
//! fixed production values (`:8080`, 15s/15s/60s timeouts).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bind address: every IPv4 interface, port 8080.
///
/// IPv6 clients are not served by the default; set `bind_address = "[::]:8080"`
/// to listen on IPv6 (dual-stack where the host allows it).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default log filter when neither CLI nor `RUST_LOG` provides one.
pub const DEFAULT_LOG_FILTER: &str = "healthz=debug,tower_http=info";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings (bind address, timeouts).
    pub server: ServerConfig,

    /// Lifecycle hook deadlines.
    pub lifecycle: LifecycleConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080" or "[::]:8080"). Port 0 picks an ephemeral port.
    pub bind_address: String,

    /// Maximum time to receive a complete request head.
    pub read_timeout_secs: u64,

    /// Maximum time for the handler to produce a response.
    pub write_timeout_secs: u64,

    /// Keep-alive connections with no request in flight are closed after this.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            read_timeout_secs: 15,
            write_timeout_secs: 15,
            idle_timeout_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Deadlines applied to each lifecycle hook.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Deadline for each `on_start` hook.
    pub start_timeout_secs: u64,

    /// Deadline for each `on_stop` hook.
    pub stop_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 15,
            stop_timeout_secs: 15,
        }
    }
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "healthz=debug,tower_http=info".
    pub filter: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}
