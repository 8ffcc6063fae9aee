//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use conduit_config::{Config, ConfigError};

use crate::health::HealthReporter;
use crate::host::{HostHandle, InMemoryHost, ManifestError, WorkspaceManifest};
use crate::server::{Server, ServerOptions};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads CLI flags, `CONDUIT_*` variables and the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::from_process()
    }
}

/// Loader that hands out a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but violates an invariant.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// Violated invariant.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds the standalone host, seeded from the workspace manifest when
    /// one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the manifest cannot be read or parsed.
    pub fn host(&self) -> Result<InMemoryHost, ManifestError> {
        match self.config.workspace_manifest() {
            Some(path) => Ok(WorkspaceManifest::load(path.as_std_path())?.into_host()),
            None => Ok(InMemoryHost::new()),
        }
    }

    /// Creates a stopped server that forwards to `host`.
    #[must_use]
    pub fn server(&self, host: HostHandle) -> Server {
        Server::new(
            ServerOptions::from_config(&self.config),
            host,
            Arc::clone(&self.reporter),
        )
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration loading, validation or
/// telemetry initialisation fails. Each failure is also reported through
/// `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.validate() {
        let error = BootstrapError::Invalid { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        telemetry,
        reporter,
    })
}
