//! Loopback JSON-RPC control plane for a host application.
//!
//! `conduitd` accepts newline-delimited JSON-RPC 2.0 requests on a loopback
//! TCP port and turns them into commands executed by the host's privileged
//! context. The host is modelled by the [`host::Host`] trait; the crate ships
//! an in-memory implementation that the standalone daemon seeds from a JSON
//! workspace manifest.
//!
//! ## Threads
//!
//! A single network thread owns the listening socket and every client
//! connection. Requests are framed, decoded and dispatched there, in arrival
//! order per connection. Anything that touches host state is sent as a
//! [`host::HostCommand`] to the privileged context, which is either a thread
//! started by [`host::spawn_privileged_context`] or a host event loop that
//! drains a [`host::HostInbox`].
//!
//! ## Lifecycle
//!
//! [`Server`] walks `Stopped -> Starting -> Running -> Stopping -> Stopped`.
//! A start that cannot bind any candidate port leaves the server stopped and
//! reports a [`StartError`]; the host process carries on.
//!
//! Lifecycle stages and client connections are reported through a
//! [`HealthReporter`].

mod bootstrap;
pub mod dispatch;
pub mod executor;
mod health;
pub mod host;
mod process;
pub mod protocol;
mod server;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
};
pub use server::{Server, ServerOptions, ServerState, StartError};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
