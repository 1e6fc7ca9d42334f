//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Wrap the dispatch service with middleware (request ID, tracing, write timeout)
//! - Bind the listener on start and report bind failures to the caller
//! - Run the accept loop on its own task, one task per connection
//! - Enforce read (request head) and idle (keep-alive) timeouts per connection
//! - Log response write failures at error level without touching other connections
//! - Close the listener and every open connection on stop
//!
//! # Design Decisions
//! - HTTP/1.1 only, served by hyper directly so the server owns its sockets
//! - Stop does not drain: in-flight requests are cut off with their connection
//! - A server runs at most once; after stop it stays closed

use std::io;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::http::Request;
use hyper::body::Incoming;
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::{FatalReporter, Shutdown, ShutdownSignal};
use crate::net::{Activity, ConnectionGuard, ConnectionTracker, Listener, ListenerError};
use crate::observability::Logger;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be acquired.
    #[error("bind failed: {0}")]
    Bind(#[source] ListenerError),

    #[error("server already started")]
    AlreadyStarted,

    #[error("server is closed and cannot be restarted")]
    ServerClosed,

    /// Stop was called on a server that is not serving.
    #[error("close failed: {0}")]
    Close(&'static str),
}

enum ServerState {
    Idle,
    Binding,
    Serving(Running),
    Closed,
}

struct Running {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    accept_task: JoinHandle<()>,
    connections: ConnectionTracker,
}

/// Timeouts applied to every connection.
#[derive(Debug, Clone, Copy)]
struct ConnectionTimeouts {
    read: Duration,
    idle: Duration,
}

/// HTTP server owning one listening socket.
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
    logger: Logger,
    state: Mutex<ServerState>,
}

impl HttpServer {
    /// Create a server dispatching to `handler`. Nothing is bound until [`start`](Self::start).
    pub fn new(handler: axum::Router, config: ServerConfig, logger: &Logger) -> Self {
        let app = Self::build_app(handler, &config);
        Self {
            app,
            config,
            logger: logger.named("HttpServer"),
            state: Mutex::new(ServerState::Idle),
        }
    }

    /// Wrap the handler with all middleware layers.
    #[allow(deprecated)]
    fn build_app(handler: axum::Router, config: &ServerConfig) -> axum::Router {
        handler
            .layer(TimeoutLayer::new(config.write_timeout()))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                    tracing::debug_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// Bind the listener and start serving in the background.
    ///
    /// Returns once the socket is bound; the accept loop keeps running on its
    /// own task. Accept failures that leave the listener unusable are sent to
    /// `fatal`.
    pub async fn start(&self, fatal: FatalReporter) -> Result<SocketAddr, ServerError> {
        {
            let mut state = self.lock_state();
            match &*state {
                ServerState::Idle => {}
                ServerState::Binding | ServerState::Serving(_) => {
                    return Err(ServerError::AlreadyStarted)
                }
                ServerState::Closed => return Err(ServerError::ServerClosed),
            }
            *state = ServerState::Binding;
        }

        let span = self.logger.span().clone();
        let listener = match Listener::bind(&self.config.bind_address)
            .instrument(span.clone())
            .await
        {
            Ok(listener) => listener,
            Err(e) => {
                *self.lock_state() = ServerState::Idle;
                return Err(ServerError::Bind(e));
            }
        };
        let local_addr = listener.local_addr();

        let shutdown = Shutdown::new();
        let connections = ConnectionTracker::new();
        let timeouts = ConnectionTimeouts {
            read: self.config.read_timeout(),
            idle: self.config.idle_timeout(),
        };
        let accept_task = tokio::spawn(
            accept_loop(
                listener,
                self.app.clone(),
                timeouts,
                shutdown.subscribe(),
                connections.clone(),
                fatal,
            )
            .instrument(span.clone()),
        );

        *self.lock_state() = ServerState::Serving(Running {
            local_addr,
            shutdown,
            accept_task,
            connections,
        });

        tracing::info!(parent: &span, address = %local_addr, "HTTP server started");
        Ok(local_addr)
    }

    /// Close the listener and every open connection.
    ///
    /// Returns once the sockets are closed. Fails if the server is not serving.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let running = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, ServerState::Closed) {
                ServerState::Serving(running) => running,
                ServerState::Closed => return Err(ServerError::Close("server already closed")),
                previous @ ServerState::Idle => {
                    *state = previous;
                    return Err(ServerError::Close("server was never started"));
                }
                previous @ ServerState::Binding => {
                    *state = previous;
                    return Err(ServerError::Close("server is still binding"));
                }
            }
        };

        let span = self.logger.span().clone();
        async move {
            tracing::info!(address = %running.local_addr, "Shutting down HTTP server");
            running.shutdown.trigger();

            if let Err(e) = running.accept_task.await {
                tracing::error!(error = %e, "Accept loop terminated abnormally");
            }
            running.connections.wait_all_closed().await;

            tracing::info!("HTTP server stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Address the listener is bound to while serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lock_state() {
            ServerState::Serving(running) => Some(running.local_addr),
            _ => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn accept_loop(
    listener: Listener,
    app: axum::Router,
    timeouts: ConnectionTimeouts,
    mut shutdown: ShutdownSignal,
    connections: ConnectionTracker,
    fatal: FatalReporter,
) {
    tracing::info!(address = %listener.local_addr(), "Accepting connections");

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    fatal.report("HttpServer", &e);
                    break;
                }
            },
        };

        let guard = connections.track();
        let span = tracing::debug_span!("connection", id = %guard.id(), peer = %peer_addr);
        tokio::spawn(
            serve_connection(stream, app.clone(), timeouts, shutdown.clone(), guard).instrument(span),
        );
    }

    drop(listener);
    tracing::info!("Listener closed");
}

async fn serve_connection(
    stream: TcpStream,
    app: axum::Router,
    timeouts: ConnectionTimeouts,
    mut shutdown: ShutdownSignal,
    guard: ConnectionGuard,
) {
    let activity = Activity::new();
    let service = {
        let activity = activity.clone();
        hyper::service::service_fn(move |request: Request<Incoming>| {
            let app = app.clone();
            let in_flight = activity.begin();
            async move {
                let response = app.oneshot(request).await;
                drop(in_flight);
                response
            }
        })
    };

    let mut builder = hyper::server::conn::http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read);
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    loop {
        let idle_left = timeouts.idle.saturating_sub(activity.idle_for());
        tokio::select! {
            result = connection.as_mut() => {
                match result {
                    Ok(()) => tracing::trace!("Connection finished"),
                    Err(e) if e.is_incomplete_message() || e.is_timeout() => {
                        tracing::debug!(error = %e, "Connection dropped");
                    }
                    Err(e) if is_peer_gone(&e) => {
                        tracing::error!(error = %e, "Failed to write response, peer disconnected");
                    }
                    Err(e) => tracing::warn!(error = %e, "Connection error"),
                }
                break;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Closing connection for shutdown");
                break;
            }
            _ = tokio::time::sleep(idle_left) => {
                if activity.idle_for() >= timeouts.idle {
                    tracing::debug!(idle_timeout = ?timeouts.idle, "Closing idle connection");
                    break;
                }
            }
        }
    }

    drop(guard);
}

/// Whether the connection failed because the client went away mid-exchange.
fn is_peer_gone(error: &hyper::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        if let Some(io_error) = err.downcast_ref::<io::Error>() {
            return matches!(
                io_error.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::WriteZero
            );
        }
        source = err.source();
    }
    false
}
