//! Loopback TCP transport.
//!
//! A single network thread binds the listening socket, accepts clients and
//! services every connection in turn with non-blocking I/O. Incoming bytes
//! are split into request units by each connection's framer and answered
//! through a [`RequestHandler`]; responses are written back on the
//! originating socket in arrival order.

mod connection;
mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod listener_tests;
mod registry;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::RequestHandler;
pub use self::listener::{ConnectionOptions, ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, RecordingReporter};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
