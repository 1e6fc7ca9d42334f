//! Ordered start/stop of registered hooks.
//!
//! # State Machine
//! ```text
//! Unstarted → Starting → Running → Stopping → Stopped
//!                 │                               ▲
//!                 └──── start failure (rollback) ─┘
//! ```
//!
//! # Design Decisions
//! - Start in registration order, stop in reverse
//! - A failing start skips the remaining starts and stops the hooks that
//!   already started, newest first
//! - A failing stop is logged and collected; the remaining stops still run
//! - Every hook runs under a deadline; a stopped lifecycle cannot restart

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::LifecycleConfig;
use crate::lifecycle::fatal::{fatal_channel, FatalError, FatalReceiver, FatalReporter};
use crate::lifecycle::hooks::{Hook, HookContext, HookError, HookTimeout};
use crate::observability::Logger;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unstarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// A hook whose `on_stop` failed.
#[derive(Debug)]
pub struct StopFailure {
    pub hook: String,
    pub error: HookError,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot {operation} lifecycle in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("hook {hook:?} failed to start: {source}")]
    StartFailed {
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("{} hook(s) failed to stop", .0.len())]
    StopFailed(Vec<StopFailure>),

    #[error("fatal error in {0}")]
    Fatal(FatalError),
}

/// Coordinator running registered hooks through the lifecycle phases.
pub struct Lifecycle {
    hooks: Vec<Box<dyn Hook>>,
    /// Number of leading hooks whose `on_start` succeeded.
    started: usize,
    state: LifecycleState,
    config: LifecycleConfig,
    logger: Logger,
    fatal_reporter: FatalReporter,
    fatal_receiver: FatalReceiver,
}

impl Lifecycle {
    pub fn new(config: LifecycleConfig, logger: &Logger) -> Self {
        let (fatal_reporter, fatal_receiver) = fatal_channel();
        Self {
            hooks: Vec::new(),
            started: 0,
            state: LifecycleState::Unstarted,
            config,
            logger: logger.named("Lifecycle"),
            fatal_reporter,
            fatal_receiver,
        }
    }

    /// Register a hook. Only allowed before the lifecycle starts.
    pub fn append(&mut self, hook: impl Hook + 'static) -> Result<(), LifecycleError> {
        self.ensure_state(LifecycleState::Unstarted, "append to")?;
        tracing::debug!(parent: self.logger.span(), hook = hook.name(), "Hook registered");
        self.hooks.push(Box::new(hook));
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Handle for background tasks to report failures after startup.
    pub fn fatal_reporter(&self) -> FatalReporter {
        self.fatal_reporter.clone()
    }

    /// Run every `on_start` in registration order.
    ///
    /// Rejected unless the lifecycle is `Unstarted`, so a second call can
    /// never start a component twice.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        self.ensure_state(LifecycleState::Unstarted, "start")?;
        let span = self.logger.span().clone();
        self.start_hooks().instrument(span).await
    }

    /// Run every `on_stop` of the started hooks in reverse order.
    pub async fn stop(&mut self) -> Result<(), LifecycleError> {
        self.ensure_state(LifecycleState::Running, "stop")?;
        let span = self.logger.span().clone();
        async {
            self.state = LifecycleState::Stopping;
            let failures = self.stop_started().await;
            self.state = LifecycleState::Stopped;

            if failures.is_empty() {
                tracing::info!("Stopped");
                Ok(())
            } else {
                Err(LifecycleError::StopFailed(failures))
            }
        }
        .instrument(span)
        .await
    }

    /// Start, wait for `signal` or a fatal report, then stop.
    pub async fn run<F>(&mut self, signal: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;

        let fatal = tokio::select! {
            _ = signal => None,
            Some(fatal) = self.fatal_receiver.recv() => Some(fatal),
        };

        let stopped = self.stop().await;
        match fatal {
            Some(fatal) => {
                if let Err(e) = stopped {
                    tracing::error!(parent: self.logger.span(), error = %e, "Stop after fatal error failed");
                }
                Err(LifecycleError::Fatal(fatal))
            }
            None => stopped,
        }
    }

    async fn start_hooks(&mut self) -> Result<(), LifecycleError> {
        self.state = LifecycleState::Starting;
        let timeout = self.config.start_timeout();

        while self.started < self.hooks.len() {
            let hook = &self.hooks[self.started];
            tracing::info!(hook = hook.name(), "OnStart hook executing");

            let began = Instant::now();
            let ctx = HookContext::with_timeout(timeout);
            match bounded("start", timeout, hook.on_start(ctx)).await {
                Ok(()) => {
                    tracing::info!(hook = hook.name(), runtime = ?began.elapsed(), "OnStart hook executed");
                    self.started += 1;
                }
                Err(source) => {
                    let hook = hook.name().to_owned();
                    tracing::error!(hook = %hook, error = %source, "OnStart hook failed, rolling back");

                    self.state = LifecycleState::Stopping;
                    for failure in self.stop_started().await {
                        tracing::error!(hook = %failure.hook, error = %failure.error, "Rollback stop failed");
                    }
                    self.state = LifecycleState::Stopped;
                    return Err(LifecycleError::StartFailed { hook, source });
                }
            }
        }

        self.state = LifecycleState::Running;
        tracing::info!(hooks = self.hooks.len(), "Running");
        Ok(())
    }

    async fn stop_started(&mut self) -> Vec<StopFailure> {
        let timeout = self.config.stop_timeout();
        let mut failures = Vec::new();

        for hook in self.hooks[..self.started].iter().rev() {
            tracing::info!(hook = hook.name(), "OnStop hook executing");

            let began = Instant::now();
            let ctx = HookContext::with_timeout(timeout);
            match bounded("stop", timeout, hook.on_stop(ctx)).await {
                Ok(()) => {
                    tracing::info!(hook = hook.name(), runtime = ?began.elapsed(), "OnStop hook executed");
                }
                Err(error) => {
                    tracing::error!(hook = hook.name(), error = %error, "OnStop hook failed");
                    failures.push(StopFailure {
                        hook: hook.name().to_owned(),
                        error,
                    });
                }
            }
        }

        self.started = 0;
        failures
    }

    fn ensure_state(
        &self,
        expected: LifecycleState,
        operation: &'static str,
    ) -> Result<(), LifecycleError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LifecycleError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

async fn bounded<F>(phase: &'static str, timeout: Duration, action: F) -> Result<(), HookError>
where
    F: Future<Output = Result<(), HookError>>,
{
    match tokio::time::timeout(timeout, action).await {
        Ok(result) => result,
        Err(_) => Err(Box::new(HookTimeout { phase, timeout })),
    }
}
