//! Scenario world for the bootstrap suite.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::health::HealthReporter;
use crate::host::spawn_privileged_context;
use crate::server::{Server, StartError};

use super::{
    FailingConfigLoader, InvalidConfigLoader, RecordingHealthReporter, TestConfigLoader,
    sample_host,
};

/// Scenario world shared across bootstrap steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    server: Option<Server>,
    pub start_result: Option<Result<u16, StartError>>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            bootstrap_error: None,
            server: None,
            start_result: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader whose configuration violates an invariant.
    pub fn use_invalid_loader(&mut self) {
        self.loader = Box::new(InvalidConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader);
        self.reset_results();
    }

    /// Runs bootstrap and stores the outcome.
    pub fn bootstrap(&mut self) {
        let reporter = Arc::clone(&self.reporter) as Arc<dyn HealthReporter>;
        match bootstrap_with(self.loader.as_ref(), reporter) {
            Ok(daemon) => {
                self.daemon = Some(daemon);
                self.bootstrap_error = None;
            }
            Err(error) => {
                self.bootstrap_error = Some(error);
            }
        }
    }

    /// Starts a server from the bootstrapped daemon.
    pub fn start_server(&mut self) {
        let Some(daemon) = self.daemon.as_ref() else {
            return;
        };
        let reply_timeout = daemon.config().host_reply_timeout();
        let (handle, _context) =
            spawn_privileged_context(sample_host(), reply_timeout).expect("spawn privileged context");
        let mut server = daemon.server(handle);
        self.start_result = Some(server.start_default());
        self.server = Some(server);
    }

    /// Stops the server, if one was started.
    pub fn stop_server(&mut self) {
        if let Some(server) = self.server.as_mut() {
            server.stop();
        }
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns true when the daemon handle is available.
    #[must_use]
    pub fn daemon_started(&self) -> bool {
        self.daemon.is_some()
    }

    /// Server started by [`TestWorld::start_server`].
    #[must_use]
    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    fn reset_results(&mut self) {
        self.daemon = None;
        self.bootstrap_error = None;
        self.server = None;
        self.start_result = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
