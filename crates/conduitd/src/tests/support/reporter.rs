//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::net::SocketAddr;
use std::sync::Mutex;

use conduit_config::{Config, ListenEndpoint};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::server::StartError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The server began binding.
    ServerStarting,
    /// The server is listening on the port.
    ServerStarted(u16),
    /// The server could not start.
    ServerStartFailed(String),
    /// The server released the port.
    ServerStopped(u16),
    /// A client connected.
    ConnectionOpened,
    /// A client connection was closed.
    ConnectionClosed,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Counts recorded events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &HealthEvent) -> usize {
        self.events().iter().filter(|seen| *seen == event).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_starting(&self, _endpoint: &ListenEndpoint) {
        self.record(HealthEvent::ServerStarting);
    }

    fn server_started(&self, addr: SocketAddr) {
        self.record(HealthEvent::ServerStarted(addr.port()));
    }

    fn server_start_failed(&self, error: &StartError) {
        self.record(HealthEvent::ServerStartFailed(error.to_string()));
    }

    fn server_stopped(&self, port: u16) {
        self.record(HealthEvent::ServerStopped(port));
    }

    fn connection_opened(&self, _peer: SocketAddr) {
        self.record(HealthEvent::ConnectionOpened);
    }

    fn connection_closed(&self, _peer: SocketAddr) {
        self.record(HealthEvent::ConnectionClosed);
    }
}
