//! Reporting of asynchronous failures from background tasks.
//!
//! A component that keeps working after its start hook returned (an accept
//! loop, for instance) cannot return an error to anyone. It reports through a
//! [`FatalReporter`] instead, and the lifecycle run phase stops the process.

use tokio::sync::mpsc;

/// An unrecoverable failure raised after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    pub component: String,
    pub message: String,
}

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.component, self.message)
    }
}

/// Sending half, cloned into every task that may fail fatally.
#[derive(Debug, Clone)]
pub struct FatalReporter {
    tx: mpsc::UnboundedSender<FatalError>,
}

impl FatalReporter {
    pub fn report(&self, component: &str, error: impl std::fmt::Display) {
        let fatal = FatalError {
            component: component.to_owned(),
            message: error.to_string(),
        };
        tracing::error!(component = %fatal.component, error = %fatal.message, "Fatal error reported");
        // Receiver gone means the lifecycle already finished; nothing left to stop.
        let _ = self.tx.send(fatal);
    }
}

/// Receiving half, owned by the lifecycle.
#[derive(Debug)]
pub struct FatalReceiver {
    rx: mpsc::UnboundedReceiver<FatalError>,
}

impl FatalReceiver {
    pub async fn recv(&mut self) -> Option<FatalError> {
        self.rx.recv().await
    }
}

pub fn fatal_channel() -> (FatalReporter, FatalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FatalReporter { tx }, FatalReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_reaches_receiver() {
        let (reporter, mut receiver) = fatal_channel();
        reporter.clone().report("HttpServer", "accept failed");

        let fatal = receiver.recv().await.unwrap();
        assert_eq!(fatal.component, "HttpServer");
        assert_eq!(fatal.to_string(), "HttpServer: accept failed");
    }
}
