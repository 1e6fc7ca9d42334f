//! Composition root.
//!
//! Builds every component in dependency order and hands references down
//! explicitly:
//!
//! ```text
//! Logger → HealthRoute → Router → HttpServer → Lifecycle (ServerHook)
//! ```
//!
//! The same function is used by the binary and by the integration tests; the
//! tests only swap the bind address for an ephemeral port.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::health::HealthRoute;
use crate::http::HttpServer;
use crate::lifecycle::{FatalReporter, Hook, HookContext, HookError, Lifecycle, LifecycleState};
use crate::observability::Logger;
use crate::routing::{Route, Router};

/// Lifecycle hook binding the HTTP server to start/stop.
pub struct ServerHook {
    server: Arc<HttpServer>,
    fatal: FatalReporter,
}

impl ServerHook {
    pub fn new(server: Arc<HttpServer>, fatal: FatalReporter) -> Self {
        Self { server, fatal }
    }
}

#[async_trait]
impl Hook for ServerHook {
    fn name(&self) -> &str {
        "HttpServer"
    }

    async fn on_start(&self, _ctx: HookContext) -> Result<(), HookError> {
        self.server.start(self.fatal.clone()).await?;
        Ok(())
    }

    /// Socket close is immediate, so the deadline is left to the coordinator.
    async fn on_stop(&self, _ctx: HookContext) -> Result<(), HookError> {
        self.server.stop().await?;
        Ok(())
    }
}

/// The assembled service.
pub struct App {
    lifecycle: Lifecycle,
    server: Arc<HttpServer>,
}

impl App {
    /// Wire the production component graph: the liveness route only.
    pub fn new(config: ServiceConfig, logger: &Logger) -> Result<Self, AppError> {
        let health: Arc<dyn Route> = Arc::new(HealthRoute::new(logger));
        Self::with_routes(config, vec![health], logger)
    }

    /// Wire the component graph around an arbitrary route set.
    pub fn with_routes(
        config: ServiceConfig,
        routes: Vec<Arc<dyn Route>>,
        logger: &Logger,
    ) -> Result<Self, AppError> {
        let router = Router::new(routes, &logger.named("Router"))?;
        tracing::debug!(parent: logger.span(), patterns = ?router.patterns().collect::<Vec<_>>(), "Dispatch table built");

        let server = Arc::new(HttpServer::new(router.into_service(), config.server, logger));

        let mut lifecycle = Lifecycle::new(config.lifecycle, logger);
        let fatal = lifecycle.fatal_reporter();
        lifecycle.append(ServerHook::new(Arc::clone(&server), fatal))?;

        Ok(Self { lifecycle, server })
    }

    /// Run the start phase. The server is bound and serving when this returns.
    pub async fn start(&mut self) -> Result<(), AppError> {
        self.lifecycle.start().await?;
        Ok(())
    }

    /// Run the stop phase.
    pub async fn stop(&mut self) -> Result<(), AppError> {
        self.lifecycle.stop().await?;
        Ok(())
    }

    /// Start, block until `signal` resolves (or a component fails), then stop.
    pub async fn run<F>(mut self, signal: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        self.lifecycle.run(signal).await?;
        Ok(())
    }

    /// Address the server is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::routing::RoutingError;

    fn ephemeral() -> ServiceConfig {
        ServiceConfig {
            server: ServerConfig {
                bind_address: "127.0.0.1:0".into(),
                ..ServerConfig::default()
            },
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn start_and_stop_follow_lifecycle() {
        let mut app = App::new(ephemeral(), &Logger::root()).unwrap();
        assert_eq!(app.state(), LifecycleState::Unstarted);
        assert!(app.local_addr().is_none());

        app.start().await.unwrap();
        assert_eq!(app.state(), LifecycleState::Running);
        assert!(app.local_addr().is_some());

        app.stop().await.unwrap();
        assert_eq!(app.state(), LifecycleState::Stopped);
        assert!(app.local_addr().is_none());
    }

    #[tokio::test]
    async fn duplicate_routes_fail_before_any_hook() {
        let logger = Logger::root();
        let routes: Vec<Arc<dyn Route>> = vec![
            Arc::new(HealthRoute::new(&logger)),
            Arc::new(HealthRoute::new(&logger)),
        ];
        let err = App::with_routes(ephemeral(), routes, &logger).err().unwrap();
        assert!(matches!(
            err,
            AppError::Routing(RoutingError::DuplicatePattern(ref p)) if p == "/healthz"
        ));
    }
}
