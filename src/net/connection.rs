//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count open connections so shutdown can wait for them to close
//! - Track per-connection activity for the idle timeout
//!
//! # Design Decisions
//! - Guards decrement on drop, so a panicking connection task still releases
//! - Idle time is measured from the end of the last request; a connection
//!   with a request in flight is never idle

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Whether a connection is currently serving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the next request on a kept-alive connection.
    Idle,
    /// At least one request in flight.
    Active,
}

/// Tracks open connections so the server can wait for all of them to close.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    open: AtomicU64,
    closed: Notify,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new open connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            inner: Arc::clone(&self.inner),
            id: ConnectionId::new(),
        }
    }

    /// Get current open connection count.
    pub fn open_count(&self) -> u64 {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has been dropped.
    pub async fn wait_all_closed(&self) {
        loop {
            let notified = self.inner.closed.notified();
            if self.open_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements the open count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    inner: Arc<TrackerInner>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.inner.open.fetch_sub(1, Ordering::SeqCst);
        self.inner.closed.notify_waiters();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Per-connection activity record used to enforce the idle timeout.
#[derive(Debug, Clone)]
pub struct Activity {
    inner: Arc<ActivityInner>,
}

#[derive(Debug)]
struct ActivityInner {
    in_flight: AtomicUsize,
    last_seen: Mutex<Instant>,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ActivityInner {
                in_flight: AtomicUsize::new(0),
                last_seen: Mutex::new(Instant::now()),
            }),
        }
    }

    /// Mark a request as started. The returned guard marks it finished.
    pub fn begin(&self) -> RequestGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn state(&self) -> ConnectionState {
        if self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            ConnectionState::Active
        } else {
            ConnectionState::Idle
        }
    }

    /// How long the connection has been idle; zero while a request is in flight.
    pub fn idle_for(&self) -> Duration {
        match self.state() {
            ConnectionState::Active => Duration::ZERO,
            ConnectionState::Idle => self.last_seen().elapsed(),
        }
    }

    fn last_seen(&self) -> Instant {
        match self.inner.last_seen.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one in-flight request; dropping it records the end of the request.
#[derive(Debug)]
pub struct RequestGuard {
    inner: Arc<ActivityInner>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        match self.inner.last_seen.lock() {
            Ok(mut guard) => *guard = Instant::now(),
            Err(poisoned) => *poisoned.into_inner() = Instant::now(),
        }
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.open_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.open_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.open_count(), 2);

        drop(guard1);
        assert_eq!(tracker.open_count(), 1);

        drop(guard2);
        assert_eq!(tracker.open_count(), 0);
    }

    #[tokio::test]
    async fn wait_all_closed_resolves_after_last_guard() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_all_closed().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn activity_idle_only_between_requests() {
        let activity = Activity::new();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(activity.idle_for(), Duration::from_secs(5));

        let request = activity.begin();
        assert_eq!(activity.state(), ConnectionState::Active);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(activity.idle_for(), Duration::ZERO);

        drop(request);
        assert_eq!(activity.state(), ConnectionState::Idle);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(activity.idle_for(), Duration::from_secs(2));
    }
}
