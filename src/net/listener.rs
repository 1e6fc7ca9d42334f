//! TCP listener wrapper.
//!
//! # Responsibilities
//! - Bind to the configured address, surfacing failures synchronously
//! - Accept incoming TCP connections
//! - Tell transient accept errors (fd exhaustion, aborted handshakes) apart
//!   from ones that mean the socket is unusable
//!
//! # Design Decisions
//! - Binding happens before serving starts, so "address in use" aborts the
//!   start phase instead of killing the process from a background task
//! - Transient accept errors back off exponentially, 5ms up to 1s

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

const INITIAL_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `addr` (e.g. "0.0.0.0:8080", or port 0 for an ephemeral port).
    pub async fn bind(addr: &str) -> Result<Self, ListenerError> {
        let bind_error = |source: io::Error| ListenerError::Bind {
            addr: addr.to_owned(),
            source,
        };

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let inner = TcpListener::bind(socket_addr).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection.
    ///
    /// Transient errors are logged and retried after a backoff; only errors
    /// that leave the listener unusable are returned.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let mut backoff = INITIAL_ACCEPT_BACKOFF;
        loop {
            match self.inner.accept().await {
                Ok((stream, peer_addr)) => {
                    tracing::debug!(peer_addr = %peer_addr, "Connection accepted");
                    return Ok((stream, peer_addr));
                }
                Err(e) if is_transient(&e) => {
                    tracing::warn!(error = %e, retry_in = ?backoff, "Accept failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_ACCEPT_BACKOFF);
                }
                Err(e) => return Err(ListenerError::Accept(e)),
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
    ) || is_resource_exhausted(error)
}

/// EMFILE, ENFILE, ENOBUFS, ENOMEM: resource exhaustion that clears up.
#[cfg(target_os = "linux")]
fn is_resource_exhausted(error: &io::Error) -> bool {
    const RESOURCE_EXHAUSTED: [i32; 4] = [24, 23, 105, 12];

    error
        .raw_os_error()
        .is_some_and(|code| RESOURCE_EXHAUSTED.contains(&code))
}

/// Errno values differ per platform; elsewhere only error kinds are trusted.
#[cfg(not(target_os = "linux"))]
fn is_resource_exhausted(_error: &io::Error) -> bool {
    false
}
