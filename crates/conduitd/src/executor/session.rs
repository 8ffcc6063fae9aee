//! Best-effort synchronisation for session loads.
//!
//! Loading a session runs on the privileged context and has no completion
//! acknowledgement the network thread can wait on directly. Instead the
//! executor polls for an observable condition: the startup project exists
//! and has a non-empty name. The condition is a heuristic. A project that
//! was already active satisfies it immediately, and a host slower than the
//! polling ceiling is reported as a failure even though the load continues.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use conduit_config::{Config, DEFAULT_SESSION_POLL_ATTEMPTS, DEFAULT_SESSION_POLL_INTERVAL_MS};
use tracing::{debug, info, warn};

use super::EXECUTOR_TARGET;

/// How long a session load is polled for readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPollPolicy {
    /// Delay before each readiness check.
    pub interval: Duration,
    /// Number of readiness checks.
    pub attempts: u32,
}

impl Default for SessionPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_SESSION_POLL_INTERVAL_MS),
            attempts: DEFAULT_SESSION_POLL_ATTEMPTS,
        }
    }
}

impl SessionPollPolicy {
    /// Builds a policy from explicit values.
    #[must_use]
    pub const fn new(interval: Duration, attempts: u32) -> Self {
        Self { interval, attempts }
    }

    /// Reads the policy from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_poll_interval(), config.session_poll_attempts())
    }
}

/// Outcome record for one in-flight session load.
///
/// The privileged context reports whether its load call succeeded on the
/// receiver this record holds. The report is logged for diagnostics only;
/// readiness is still decided by polling.
#[derive(Debug)]
pub(crate) struct PendingSessionLoad {
    name: String,
    recorded: Receiver<bool>,
    outcome: Option<bool>,
}

impl PendingSessionLoad {
    pub(crate) fn new(name: &str, recorded: Receiver<bool>) -> Self {
        Self {
            name: name.to_owned(),
            recorded,
            outcome: None,
        }
    }

    /// Picks up the recorded outcome if it has arrived.
    pub(crate) fn observe(&mut self) -> Option<bool> {
        if self.outcome.is_none() {
            match self.recorded.try_recv() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
            }
        }
        self.outcome
    }

    /// Logs how the load ended after `checks` readiness checks.
    pub(crate) fn finish(mut self, ready: bool, checks: u32) {
        let recorded = self.observe();
        if ready {
            info!(
                target: EXECUTOR_TARGET,
                session = %self.name,
                checks,
                recorded = ?recorded,
                "session ready"
            );
        } else {
            warn!(
                target: EXECUTOR_TARGET,
                session = %self.name,
                checks,
                recorded = ?recorded,
                "session not ready before polling ceiling; load continues in the host"
            );
        }
        if recorded == Some(false) {
            debug!(
                target: EXECUTOR_TARGET,
                session = %self.name,
                "host reported the load call as unsuccessful"
            );
        }
    }
}
