//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::host::spawn_privileged_context;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_POLL};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, host construction, server start
/// or signal installation fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(SHUTDOWN_POLL),
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter)?;
    let host = daemon.host()?;
    let quit = host.quit_flag();
    let (handle, context) =
        spawn_privileged_context(host, daemon.config().host_reply_timeout())?;

    let mut server = daemon.server(handle);
    let port = server.start_default()?;
    info!(target: PROCESS_TARGET, port, "daemon ready");

    let cause = shutdown.wait(&quit)?;
    info!(target: PROCESS_TARGET, %cause, "shutting down");
    server.stop();
    drop(server);
    context.join()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
