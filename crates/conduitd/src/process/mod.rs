//! Process supervision for the standalone daemon: launch sequencing and
//! shutdown handling.

use std::time::Duration;

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_daemon;
pub use shutdown::{ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const SHUTDOWN_POLL: Duration = Duration::from_millis(100);
