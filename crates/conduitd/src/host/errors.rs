//! Error types for the privileged-context hand-off.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures while exchanging commands with the privileged context.
#[derive(Debug, Error)]
pub enum HostError {
    /// The privileged context has shut down and no longer accepts commands.
    #[error("privileged context unavailable; `{command}` was not delivered")]
    Unavailable {
        /// Command that could not be queued.
        command: &'static str,
    },
    /// The command was queued but no answer arrived in time.
    #[error("privileged context did not answer `{command}` within {}ms", waited.as_millis())]
    Timeout {
        /// Command awaiting an answer.
        command: &'static str,
        /// Time spent waiting.
        waited: Duration,
    },
    /// The command was discarded without an answer.
    #[error("privileged context dropped `{command}` without answering")]
    Dropped {
        /// Command that went unanswered.
        command: &'static str,
    },
    /// The privileged thread could not be started.
    #[error("failed to spawn privileged context thread: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The privileged thread panicked.
    #[error("privileged context thread panicked")]
    Panicked,
}
