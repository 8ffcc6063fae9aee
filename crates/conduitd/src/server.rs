//! Server lifecycle: `Stopped -> Starting -> Running -> Stopping -> Stopped`.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use conduit_config::{Config, ListenEndpoint};
use thiserror::Error;
use tracing::warn;

use crate::dispatch::Dispatcher;
use crate::executor::{CommandExecutor, SessionPollPolicy};
use crate::health::HealthReporter;
use crate::host::HostHandle;
use crate::transport::{ConnectionOptions, ListenerError, ListenerHandle, SocketListener};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Lifecycle state of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not listening.
    Stopped,
    /// Binding the endpoint.
    Starting,
    /// Accepting and serving connections.
    Running,
    /// Closing connections and releasing the port.
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        })
    }
}

/// Reasons [`Server::start`] did not leave the server running.
///
/// None of these are fatal to the process; the server simply stays stopped.
#[derive(Debug, Error)]
pub enum StartError {
    /// `start` was called while the server was not stopped.
    #[error("server is already {state}")]
    NotStopped {
        /// State at the time of the call.
        state: ServerState,
    },
    /// The listener could not be bound or started.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Settings fixed for the lifetime of a [`Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Endpoint whose host and fallback span are used on start.
    pub endpoint: ListenEndpoint,
    /// Per-connection limits.
    pub connection: ConnectionOptions,
    /// Readiness polling for `loadSession`.
    pub session_poll: SessionPollPolicy,
}

impl ServerOptions {
    /// Reads the options from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.listen_endpoint(),
            connection: ConnectionOptions::from_config(config),
            session_poll: SessionPollPolicy::from_config(config),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// JSON-RPC control-plane server.
///
/// Each start builds a fresh dispatcher, so advisory timeouts changed through
/// `setMethodMetadata` last until the next stop.
pub struct Server {
    options: ServerOptions,
    host: HostHandle,
    reporter: Arc<dyn HealthReporter>,
    state: ServerState,
    listener: Option<ListenerHandle>,
}

impl fmt::Debug for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Server")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a stopped server.
    #[must_use]
    pub fn new(options: ServerOptions, host: HostHandle, reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            options,
            host,
            reporter,
            state: ServerState::Stopped,
            listener: None,
        }
    }

    /// Starts listening, probing from `preferred_port` across the configured
    /// span, and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] when the server is not stopped or no candidate
    /// port could be bound. The server stays stopped on failure.
    pub fn start(&mut self, preferred_port: u16) -> Result<u16, StartError> {
        if self.state != ServerState::Stopped {
            return Err(StartError::NotStopped { state: self.state });
        }
        let endpoint = self.options.endpoint.with_preferred_port(preferred_port);
        self.state = ServerState::Starting;
        self.reporter.server_starting(&endpoint);
        match self.launch(&endpoint) {
            Ok(handle) => {
                let addr = handle.local_addr();
                self.listener = Some(handle);
                self.state = ServerState::Running;
                self.reporter.server_started(addr);
                Ok(addr.port())
            }
            Err(error) => {
                self.state = ServerState::Stopped;
                let error = StartError::from(error);
                self.reporter.server_start_failed(&error);
                Err(error)
            }
        }
    }

    /// Starts on the configured preferred port.
    ///
    /// # Errors
    ///
    /// See [`Server::start`].
    pub fn start_default(&mut self) -> Result<u16, StartError> {
        self.start(self.options.endpoint.preferred_port())
    }

    /// Closes every connection within the drain timeout and releases the
    /// port. Does nothing when the server is not running.
    pub fn stop(&mut self) {
        let Some(handle) = self.listener.take() else {
            return;
        };
        self.state = ServerState::Stopping;
        let port = handle.local_addr().port();
        handle.shutdown();
        if let Err(error) = handle.join() {
            warn!(target: SERVER_TARGET, error = %error, "network thread failed");
        }
        self.state = ServerState::Stopped;
        self.reporter.server_stopped(port);
    }

    /// Whether the server is accepting connections.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    /// Bound port while running.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.local_addr().map(|addr| addr.port())
    }

    /// Bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Human-readable status line.
    #[must_use]
    pub fn status(&self) -> String {
        match self.local_addr() {
            Some(addr) if self.is_running() => format!("running on {addr}"),
            _ => self.state.to_string(),
        }
    }

    fn launch(&self, endpoint: &ListenEndpoint) -> Result<ListenerHandle, ListenerError> {
        let listener = SocketListener::bind(endpoint)?;
        let executor = CommandExecutor::new(self.host.clone(), self.options.session_poll);
        listener.start(
            Box::new(Dispatcher::new(executor)),
            self.options.connection,
            Arc::clone(&self.reporter),
        )
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
