//! Error types for socket listener operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured host could not be resolved.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Port being resolved.
        port: u16,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Port being resolved.
        port: u16,
    },
    /// The host resolved to an address other than loopback.
    #[error("refusing to listen on non-loopback address {addr}")]
    NonLoopback {
        /// Offending address.
        addr: SocketAddr,
    },
    /// Every candidate port failed to bind.
    #[error("no port available for {endpoint}: {source}")]
    Exhausted {
        /// Endpoint whose candidates were tried.
        endpoint: String,
        /// Error from the last candidate.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking mode.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The network thread could not be spawned.
    #[error("failed to spawn network thread: {source}")]
    ThreadSpawn {
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },
    /// The network thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
