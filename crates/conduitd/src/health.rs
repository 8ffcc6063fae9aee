//! Structured health reporting for daemon lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use conduit_config::{Config, ListenEndpoint};

use crate::bootstrap::BootstrapError;
use crate::server::StartError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before the server binds its endpoint.
    fn server_starting(&self, endpoint: &ListenEndpoint);

    /// Invoked once the server is accepting connections.
    fn server_started(&self, addr: SocketAddr);

    /// Invoked when the server could not start.
    fn server_start_failed(&self, error: &StartError);

    /// Invoked after the server released its port.
    fn server_stopped(&self, port: u16);

    /// Invoked when a client connection is accepted.
    fn connection_opened(&self, peer: SocketAddr);

    /// Invoked when a client connection is torn down.
    fn connection_closed(&self, peer: SocketAddr);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_starting(&self, endpoint: &ListenEndpoint) {
        (**self).server_starting(endpoint);
    }

    fn server_started(&self, addr: SocketAddr) {
        (**self).server_started(addr);
    }

    fn server_start_failed(&self, error: &StartError) {
        (**self).server_start_failed(error);
    }

    fn server_stopped(&self, port: u16) {
        (**self).server_stopped(port);
    }

    fn connection_opened(&self, peer: SocketAddr) {
        (**self).connection_opened(peer);
    }

    fn connection_closed(&self, peer: SocketAddr) {
        (**self).connection_closed(peer);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            endpoint = %config.listen_endpoint(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn server_starting(&self, endpoint: &ListenEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_starting",
            endpoint = %endpoint,
            "starting server"
        );
    }

    fn server_started(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_started",
            addr = %addr,
            "server listening"
        );
    }

    fn server_start_failed(&self, error: &StartError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "server_start_failed",
            error = %error,
            "server failed to start"
        );
    }

    fn server_stopped(&self, port: u16) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_stopped",
            port,
            "server stopped"
        );
    }

    fn connection_opened(&self, peer: SocketAddr) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "connection_opened",
            peer = %peer,
            "client connected"
        );
    }

    fn connection_closed(&self, peer: SocketAddr) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "connection_closed",
            peer = %peer,
            "client disconnected"
        );
    }
}
