//! Liveness probe route.
//!
//! Answers `/healthz` with `200 OK` and the two-byte body `OK` as long as the
//! process can serve HTTP at all. It has no state and never inspects the
//! request, so every method is answered the same way.
//!
//! Building the response cannot fail. Writing it happens after the handler
//! returns, so a client that disconnects mid-write is only visible on the
//! connection; the HTTP server logs that at error level and drops the socket.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::observability::Logger;
use crate::routing::Route;

/// Path the liveness probe is bound to.
pub const HEALTHZ_PATH: &str = "/healthz";

/// Body returned by a healthy process.
pub const HEALTHY_BODY: &str = "OK";

/// The `/healthz` route.
#[derive(Debug, Clone)]
pub struct HealthRoute {
    logger: Logger,
}

impl HealthRoute {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.named("HealthRoute"),
        }
    }
}

#[async_trait]
impl Route for HealthRoute {
    fn pattern(&self) -> &str {
        HEALTHZ_PATH
    }

    async fn handle(&self, request: Request<Body>) -> Response {
        async move {
            tracing::debug!(method = %request.method(), "Healthz");
            healthy_response()
        }
        .instrument(self.logger.span().clone())
        .await
    }
}

fn healthy_response() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        HEALTHY_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), 64)
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_pattern_is_healthz() {
        assert_eq!(HealthRoute::new(&Logger::root()).pattern(), "/healthz");
    }

    #[tokio::test]
    async fn test_handle_returns_ok() {
        let route = HealthRoute::new(&Logger::root());
        let request = Request::get("/healthz").body(Body::empty()).unwrap();

        let response = route.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_of(response).await, b"OK");
    }

    #[tokio::test]
    async fn test_any_method_is_answered() {
        let route = HealthRoute::new(&Logger::root());
        for method in ["POST", "PUT", "DELETE", "HEAD"] {
            let request = Request::builder()
                .method(method)
                .uri("/healthz")
                .body(Body::empty())
                .unwrap();
            assert_eq!(route.handle(request).await.status(), StatusCode::OK);
        }
    }
}
