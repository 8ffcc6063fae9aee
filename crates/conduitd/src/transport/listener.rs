//! Loopback TCP listener and the network thread that serves it.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use conduit_config::{Config, ListenEndpoint};
use tracing::{debug, info, warn};

use super::registry::ConnectionRegistry;
use super::{LISTENER_TARGET, ListenerError, RequestHandler};
use crate::health::HealthReporter;

const IDLE_BACKOFF: Duration = Duration::from_millis(10);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const NETWORK_THREAD_NAME: &str = "conduit-network";

/// Per-connection limits applied by the network thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Cap on buffered bytes that have not yet formed a complete unit.
    pub max_unframed_bytes: usize,
    /// Bounded wait for graceful closes when the listener stops.
    pub drain_timeout: Duration,
}

impl ConnectionOptions {
    /// Reads the limits from the resolved configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            max_unframed_bytes: config.max_unframed_bytes(),
            drain_timeout: config.drain_timeout(),
        }
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A bound, not yet serving, loopback listener.
#[derive(Debug)]
pub struct SocketListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl SocketListener {
    /// Binds the first available candidate port of `endpoint`.
    ///
    /// Candidates are tried in order; a failure on one moves on to the
    /// next.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NonLoopback`] when the host resolves to a
    /// non-loopback address, a resolution error, or
    /// [`ListenerError::Exhausted`] carrying the last bind error when no
    /// candidate could be bound.
    pub fn bind(endpoint: &ListenEndpoint) -> Result<Self, ListenerError> {
        let mut last_error = None;
        for port in endpoint.candidate_ports() {
            let addr = resolve_loopback(endpoint.host(), port)?;
            match TcpListener::bind(addr) {
                Ok(listener) => {
                    let local_addr = listener.local_addr().unwrap_or(addr);
                    debug!(target: LISTENER_TARGET, addr = %local_addr, "bound listener");
                    return Ok(Self {
                        listener,
                        local_addr,
                    });
                }
                Err(error) => {
                    debug!(
                        target: LISTENER_TARGET,
                        addr = %addr,
                        error = %error,
                        "candidate port unavailable"
                    );
                    last_error = Some(error);
                }
            }
        }
        Err(ListenerError::Exhausted {
            endpoint: endpoint.to_string(),
            source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable)),
        })
    }

    /// Address actually bound.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts the network thread.
    ///
    /// The thread accepts connections, services every registered connection
    /// in turn and, once shut down, closes them within the drain timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the socket cannot be made non-blocking
    /// or the thread cannot be spawned.
    pub fn start(
        self,
        handler: Box<dyn RequestHandler>,
        options: ConnectionOptions,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let local_addr = self.local_addr;
        let handle = thread::Builder::new()
            .name(NETWORK_THREAD_NAME.to_owned())
            .spawn(move || run_network_loop(&self, &shutdown_flag, handler, options, &*reporter))
            .map_err(|source| ListenerError::ThreadSpawn { source })?;
        Ok(ListenerHandle {
            shutdown,
            local_addr,
            handle: Some(handle),
        })
    }
}

/// Handle to the background network thread.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Address the listener is serving.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the network thread to stop after its current turn.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the network thread to close its connections and exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_network_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    mut handler: Box<dyn RequestHandler>,
    options: ConnectionOptions,
    reporter: &dyn HealthReporter,
) {
    info!(
        target: LISTENER_TARGET,
        addr = %listener.local_addr,
        "socket listener active"
    );
    let mut registry = ConnectionRegistry::new(options.max_unframed_bytes);
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        let accepted = match accept_pending(listener, &mut registry, reporter) {
            Ok(accepted) => {
                last_error = None;
                accepted
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
                false
            }
        };
        let serviced = registry.service(handler.as_mut(), reporter);
        if !accepted && !serviced {
            thread::sleep(IDLE_BACKOFF);
        }
    }
    registry.close_all(options.drain_timeout, reporter);
    info!(
        target: LISTENER_TARGET,
        addr = %listener.local_addr,
        "socket listener stopped"
    );
}

/// Accepts every pending connection. Returns whether any arrived.
fn accept_pending(
    listener: &SocketListener,
    registry: &mut ConnectionRegistry,
    reporter: &dyn HealthReporter,
) -> io::Result<bool> {
    let mut accepted = false;
    loop {
        match listener.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(true)?;
                if let Err(error) = stream.set_nodelay(true) {
                    debug!(target: LISTENER_TARGET, error = %error, "failed to set TCP_NODELAY");
                }
                registry.insert(stream, peer, reporter);
                accepted = true;
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(accepted),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

fn resolve_loopback(host: &str, port: u16) -> Result<SocketAddr, ListenerError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .collect();
    if let Some(addr) = addrs.iter().find(|addr| !addr.ip().is_loopback()) {
        return Err(ListenerError::NonLoopback { addr: *addr });
    }
    addrs
        .into_iter()
        .next()
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })
}
