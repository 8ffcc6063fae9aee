//! Connection registry owned by the network thread.

use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::connection::{Activity, ClientConnection, ConnectionId};
use super::{LISTENER_TARGET, RequestHandler};
use crate::health::HealthReporter;

const CLOSE_POLL: Duration = Duration::from_millis(10);

/// Every live connection, keyed by accept order.
#[derive(Debug)]
pub(crate) struct ConnectionRegistry {
    next_id: u64,
    max_unframed_bytes: usize,
    connections: BTreeMap<ConnectionId, ClientConnection>,
}

impl ConnectionRegistry {
    pub(crate) const fn new(max_unframed_bytes: usize) -> Self {
        Self {
            next_id: 0,
            max_unframed_bytes,
            connections: BTreeMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registers an accepted, already non-blocking stream.
    pub(crate) fn insert(
        &mut self,
        stream: TcpStream,
        peer: SocketAddr,
        reporter: &dyn HealthReporter,
    ) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        self.connections.insert(
            id,
            ClientConnection::new(id, peer, stream, self.max_unframed_bytes),
        );
        reporter.connection_opened(peer);
        debug!(target: LISTENER_TARGET, connection = %id, peer = %peer, "connection registered");
        id
    }

    /// Gives every connection one service turn and drops the closed ones.
    ///
    /// Returns `true` when any connection moved bytes or closed.
    pub(crate) fn service(
        &mut self,
        handler: &mut dyn RequestHandler,
        reporter: &dyn HealthReporter,
    ) -> bool {
        let mut progressed = false;
        let mut closed = Vec::new();
        for (id, connection) in &mut self.connections {
            match connection.service(handler) {
                Activity::Idle => {}
                Activity::Busy => progressed = true,
                Activity::Closed => closed.push(*id),
            }
        }
        for id in closed {
            progressed = true;
            if let Some(connection) = self.connections.remove(&id) {
                reporter.connection_closed(connection.peer());
            }
        }
        progressed
    }

    /// Closes every connection gracefully, forcing whatever remains once
    /// `drain_timeout` has elapsed. The registry is empty afterwards.
    pub(crate) fn close_all(&mut self, drain_timeout: Duration, reporter: &dyn HealthReporter) {
        if self.is_empty() {
            return;
        }
        let deadline = Instant::now() + drain_timeout;
        info!(
            target: LISTENER_TARGET,
            connections = self.connections.len(),
            drain_timeout_ms = drain_timeout.as_millis(),
            "closing client connections"
        );
        loop {
            self.connections.retain(|_, connection| {
                let finished = connection.poll_close();
                if finished {
                    reporter.connection_closed(connection.peer());
                }
                !finished
            });
            if self.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(CLOSE_POLL);
        }
        if !self.is_empty() {
            info!(
                target: LISTENER_TARGET,
                connections = self.len(),
                "forcing close of lingering connections"
            );
        }
        for (_, connection) in std::mem::take(&mut self.connections) {
            reporter.connection_closed(connection.peer());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    use serde_json::json;

    use super::*;
    use crate::health::StructuredHealthReporter;
    use crate::protocol::Response;

    fn accept(listener: &TcpListener) -> (TcpStream, SocketAddr) {
        let (stream, peer) = listener.accept().expect("accept connection");
        stream.set_nonblocking(true).expect("non-blocking stream");
        (stream, peer)
    }

    fn ok(_: &[u8]) -> Response {
        Response::success(json!(1), json!(true))
    }

    #[test]
    fn closed_peers_are_removed() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let reporter = StructuredHealthReporter::new();
        let mut registry = ConnectionRegistry::new(1024);

        let client = TcpStream::connect(addr).expect("connect client");
        let (stream, peer) = accept(&listener);
        registry.insert(stream, peer, &reporter);
        assert_eq!(registry.len(), 1);

        drop(client);
        let mut handler = ok;
        let deadline = Instant::now() + Duration::from_secs(2);
        while !registry.is_empty() {
            assert!(Instant::now() < deadline, "closed peer was not removed");
            registry.service(&mut handler, &reporter);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn responses_are_flushed_after_a_half_close() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let reporter = StructuredHealthReporter::new();
        let mut registry = ConnectionRegistry::new(1024);

        let mut client = TcpStream::connect(addr).expect("connect client");
        let (stream, peer) = accept(&listener);
        registry.insert(stream, peer, &reporter);
        client.write_all(b"{}\n").expect("write request");
        client
            .shutdown(std::net::Shutdown::Write)
            .expect("half close client");

        let mut handler = ok;
        let deadline = Instant::now() + Duration::from_secs(2);
        while !registry.is_empty() {
            assert!(Instant::now() < deadline, "connection never closed");
            registry.service(&mut handler, &reporter);
            thread::sleep(Duration::from_millis(5));
        }
        let mut line = String::new();
        BufReader::new(client).read_line(&mut line).expect("read response");
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn close_all_empties_the_registry_within_the_drain_timeout() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let reporter = StructuredHealthReporter::new();
        let mut registry = ConnectionRegistry::new(1024);

        let mut lingering = TcpStream::connect(addr).expect("connect client");
        let (stream, peer) = accept(&listener);
        registry.insert(stream, peer, &reporter);

        let started = Instant::now();
        registry.close_all(Duration::from_millis(100), &reporter);
        assert!(registry.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));

        let mut buffer = [0_u8; 1];
        let read = lingering.read(&mut buffer).expect("read after close");
        assert_eq!(read, 0, "server should have shut down its write half");
    }
}
