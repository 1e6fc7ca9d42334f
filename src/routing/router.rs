//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the bound routes keyed by pattern
//! - Reject conflicting or malformed patterns at construction
//! - Expose the table as a single `axum` service
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Fail fast on duplicate patterns rather than first-wins
//! - Static paths only; unmapped paths fall through to axum's empty 404

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{body::Body, http::Request, routing::any};
use thiserror::Error;

use crate::observability::Logger;
use crate::routing::route::Route;

/// Errors raised while building the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no routes registered")]
    Empty,

    #[error("duplicate route pattern {0:?}")]
    DuplicatePattern(String),

    #[error("route pattern {0:?} must be a static path starting with '/'")]
    InvalidPattern(String),
}

/// Dispatch table mapping static paths to routes.
pub struct Router {
    table: BTreeMap<String, Arc<dyn Route>>,
}

impl Router {
    /// Bind `routes` into a dispatch table.
    ///
    /// Routes are checked in the order given; the first duplicate or
    /// malformed pattern aborts construction.
    pub fn new(routes: Vec<Arc<dyn Route>>, logger: &Logger) -> Result<Self, RoutingError> {
        if routes.is_empty() {
            return Err(RoutingError::Empty);
        }

        let _entered = logger.span().enter();
        let mut table = BTreeMap::new();
        for route in routes {
            let pattern = route.pattern().to_owned();
            if !is_static_path(&pattern) {
                return Err(RoutingError::InvalidPattern(pattern));
            }
            if table.contains_key(&pattern) {
                return Err(RoutingError::DuplicatePattern(pattern));
            }
            tracing::debug!(pattern = %pattern, "Route bound");
            table.insert(pattern, route);
        }

        Ok(Self { table })
    }

    /// Find the route bound to exactly `path`.
    pub fn lookup(&self, path: &str) -> Option<&Arc<dyn Route>> {
        self.table.get(path)
    }

    /// Bound patterns in sorted order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Freeze the table into the service the HTTP server dispatches to.
    ///
    /// Every method is forwarded to the route; routes decide for themselves
    /// whether to care about it.
    pub fn into_service(self) -> axum::Router {
        self.table
            .into_iter()
            .fold(axum::Router::new(), |app, (pattern, route)| {
                app.route(
                    &pattern,
                    any(move |request: Request<Body>| {
                        let route = Arc::clone(&route);
                        async move { route.handle(request).await }
                    }),
                )
            })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("patterns", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn is_static_path(pattern: &str) -> bool {
    pattern.starts_with('/')
        && !pattern
            .chars()
            .any(|c| matches!(c, '{' | '}' | ':' | '*' | '?' | '#') || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use tower::ServiceExt;

    struct Fixed {
        pattern: &'static str,
        body: &'static str,
    }

    #[async_trait]
    impl Route for Fixed {
        fn pattern(&self) -> &str {
            self.pattern
        }

        async fn handle(&self, _request: Request<Body>) -> Response {
            self.body.into_response()
        }
    }

    fn fixed(pattern: &'static str, body: &'static str) -> Arc<dyn Route> {
        Arc::new(Fixed { pattern, body })
    }

    async fn send(app: axum::Router, method: &str, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let err = Router::new(
            vec![fixed("/a", "first"), fixed("/b", "b"), fixed("/a", "second")],
            &Logger::root(),
        )
        .unwrap_err();
        assert_eq!(err, RoutingError::DuplicatePattern("/a".into()));
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        for pattern in ["healthz", "/users/{id}", "/files/*", "", "/a b"] {
            let err = Router::new(vec![fixed(pattern, "")], &Logger::root()).unwrap_err();
            assert_eq!(err, RoutingError::InvalidPattern(pattern.into()));
        }
    }

    #[test]
    fn test_empty_route_set_rejected() {
        assert_eq!(
            Router::new(Vec::new(), &Logger::root()).unwrap_err(),
            RoutingError::Empty
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let router = Router::new(vec![fixed("/b", "b"), fixed("/a", "a")], &Logger::root()).unwrap();
        assert!(router.lookup("/a").is_some());
        assert!(router.lookup("/a/").is_none());
        assert!(router.lookup("/c").is_none());
        assert_eq!(router.patterns().collect::<Vec<_>>(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_dispatch_and_fallback() {
        let app = Router::new(vec![fixed("/a", "alpha")], &Logger::root())
            .unwrap()
            .into_service();

        let (status, body) = send(app.clone(), "GET", "/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"alpha");

        let (status, body) = send(app.clone(), "DELETE", "/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"alpha");

        let (status, body) = send(app, "GET", "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }
}
