//! Shutdown triggers: termination signals or a client `quit`.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Why the daemon is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A termination signal arrived.
    Signal(i32),
    /// A client asked the host to quit.
    QuitRequested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(formatter, "signal {signal}"),
            Self::QuitRequested => formatter.write_str("quit requested"),
        }
    }
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed. `quit` is raised by the host
    /// when a client calls `quit`.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener cannot be installed.
    fn wait(&self, quit: &AtomicBool) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Clone)]
pub struct SystemShutdownSignal {
    poll_interval: Duration,
}

impl SystemShutdownSignal {
    /// Builds a listener that checks for signals and quit requests every
    /// `poll_interval`.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self, quit: &AtomicBool) -> Result<ShutdownCause, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        loop {
            if let Some(signal) = signals.pending().next() {
                info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                return Ok(ShutdownCause::Signal(signal));
            }
            if quit.load(Ordering::SeqCst) {
                info!(target: PROCESS_TARGET, "quit requested by client");
                return Ok(ShutdownCause::QuitRequested);
            }
            thread::sleep(self.poll_interval);
        }
    }
}
