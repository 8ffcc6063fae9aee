//! Defines the unified error surface for daemon launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::host::{HostError, ManifestError};
use crate::server::StartError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },
    /// The workspace manifest could not be loaded.
    #[error("failed to load workspace manifest: {source}")]
    Manifest {
        /// Underlying manifest error.
        #[from]
        source: ManifestError,
    },
    /// The privileged context could not be started or stopped.
    #[error("privileged context failed: {source}")]
    Host {
        /// Underlying host error.
        #[from]
        source: HostError,
    },
    /// The server did not start.
    #[error("server failed to start: {source}")]
    Start {
        /// Underlying start error.
        #[from]
        source: StartError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[from]
        source: ShutdownError,
    },
}
