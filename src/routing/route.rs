//! The route capability.
//!
//! Anything that can answer HTTP requests and names the static path it wants
//! to be bound to. Routes are constructed by the composition root and moved
//! into the [`Router`](super::Router), which owns them for the rest of the
//! process.

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};

/// A request handler bound to one static URL path.
#[async_trait]
pub trait Route: Send + Sync + 'static {
    /// The exact path this route serves, e.g. `/healthz`.
    fn pattern(&self) -> &str;

    /// Handle one request.
    ///
    /// Implementations must not panic; failures are turned into an error
    /// response by the route itself.
    async fn handle(&self, request: Request<Body>) -> Response;
}
