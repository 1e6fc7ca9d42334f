//! Shared utilities for integration and load testing.
//!
//! Builds the same component graph as the binary, bound to an ephemeral
//! port on loopback.

use std::net::SocketAddr;

use healthz::config::{ServerConfig, ServiceConfig};
use healthz::{App, Logger};

/// Service config bound to `127.0.0.1:0`.
pub fn ephemeral_config() -> ServiceConfig {
    ServiceConfig {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// Compose and start the full service; returns it with its bound address.
pub async fn start_app() -> (App, SocketAddr) {
    let mut app = App::new(ephemeral_config(), &Logger::root()).expect("compose app");
    app.start().await.expect("start app");
    let addr = app.local_addr().expect("app should be bound after start");
    (app, addr)
}

/// HTTP client that never goes through an environment proxy or reuses sockets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("build client")
}
