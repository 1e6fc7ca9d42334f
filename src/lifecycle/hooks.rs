//! Lifecycle hook definitions.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

/// Error type returned by hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Deadline handed to each hook invocation.
///
/// The coordinator also enforces the deadline from outside, so a hook that
/// ignores it is cancelled at its next suspension point.
#[derive(Debug, Clone, Copy)]
pub struct HookContext {
    deadline: Instant,
}

impl HookContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Raised when a hook does not finish before its deadline.
#[derive(Debug, Clone, Error)]
#[error("{phase} hook timed out after {timeout:?}")]
pub struct HookTimeout {
    pub phase: &'static str,
    pub timeout: Duration,
}

/// A pair of optional start/stop actions registered with the lifecycle.
///
/// Both actions default to doing nothing.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name used in lifecycle logs and errors.
    fn name(&self) -> &str;

    async fn on_start(&self, _ctx: HookContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn on_stop(&self, _ctx: HookContext) -> Result<(), HookError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_context_remaining_counts_down() {
        let ctx = HookContext::with_timeout(Duration::from_secs(10));
        assert!(!ctx.is_expired());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(ctx.remaining(), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(7)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
