//! A single accepted client socket and its framing state.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use tracing::{debug, warn};

use super::{LISTENER_TARGET, RequestHandler};
use crate::protocol::{FrameEvent, LineFramer, ProtocolError, Rejection, Response, encode};

const READ_CHUNK: usize = 8 * 1024;
const MAX_READS_PER_TURN: usize = 16;

/// Registry key for an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// What a service turn observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    /// Nothing to read or write.
    Idle,
    /// Bytes moved in either direction.
    Busy,
    /// The peer went away or the socket failed.
    Closed,
}

/// A live socket, its receive buffer and its pending output.
#[derive(Debug)]
pub(crate) struct ClientConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
    framer: LineFramer,
    pending: VecDeque<FrameEvent>,
    outbox: Vec<u8>,
    outbox_limit: usize,
    read_closed: bool,
    write_closed: bool,
}

impl ClientConnection {
    pub(crate) fn new(
        id: ConnectionId,
        peer: SocketAddr,
        stream: TcpStream,
        max_unframed_bytes: usize,
    ) -> Self {
        Self {
            id,
            peer,
            stream,
            framer: LineFramer::new(max_unframed_bytes),
            pending: VecDeque::new(),
            outbox: Vec::new(),
            outbox_limit: max_unframed_bytes,
            read_closed: false,
            write_closed: false,
        }
    }

    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Reads what is available, answers every complete unit and flushes
    /// as much output as the socket accepts.
    ///
    /// Units are answered only while unflushed output stays below the
    /// unframed-input cap; past it the connection stops reading until the
    /// peer drains its responses. Once the peer has closed its write half,
    /// pending responses are still flushed before the connection reports
    /// [`Activity::Closed`].
    pub(crate) fn service(&mut self, handler: &mut dyn RequestHandler) -> Activity {
        let mut busy = false;
        let mut chunk = [0_u8; READ_CHUNK];
        for _ in 0..MAX_READS_PER_TURN {
            busy |= self.answer_pending(handler);
            if self.read_closed || self.backlogged() {
                break;
            }
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(target: LISTENER_TARGET, connection = %self.id, "peer closed");
                    self.read_closed = true;
                }
                Ok(read) => {
                    busy = true;
                    self.pending.extend(self.framer.push(&chunk[..read]));
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    self.log_socket_error("read", &error);
                    return Activity::Closed;
                }
            }
        }
        match self.flush_outbox() {
            Ok(_) if self.read_closed && self.pending.is_empty() && self.outbox.is_empty() => {
                Activity::Closed
            }
            Ok(flushed) if busy || flushed > 0 => Activity::Busy,
            Ok(_) => Activity::Idle,
            Err(error) => {
                self.log_socket_error("write", &error);
                Activity::Closed
            }
        }
    }

    /// Whether unanswered units or unflushed output should hold off reads.
    fn backlogged(&self) -> bool {
        !self.pending.is_empty() || self.outbox.len() >= self.outbox_limit
    }

    /// Answers queued units until the outbox reaches its high-water mark.
    fn answer_pending(&mut self, handler: &mut dyn RequestHandler) -> bool {
        let mut answered = false;
        while self.outbox.len() < self.outbox_limit {
            let Some(event) = self.pending.pop_front() else {
                break;
            };
            self.answer(event, handler);
            answered = true;
        }
        answered
    }

    /// Advances a graceful close: flush pending output, shut down the write
    /// half, then discard input until the peer closes.
    ///
    /// Returns `true` once the connection can be dropped.
    pub(crate) fn poll_close(&mut self) -> bool {
        if !self.write_closed {
            match self.flush_outbox() {
                Ok(_) if self.outbox.is_empty() => {
                    if let Err(error) = self.stream.shutdown(Shutdown::Write) {
                        debug!(
                            target: LISTENER_TARGET,
                            connection = %self.id,
                            error = %error,
                            "write shutdown failed"
                        );
                        return true;
                    }
                    self.write_closed = true;
                }
                Ok(_) => return false,
                Err(_) => return true,
            }
        }
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return true,
                Ok(_) => {}
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return false,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => return true,
            }
        }
    }

    fn answer(&mut self, event: FrameEvent, handler: &mut dyn RequestHandler) {
        let response = match event {
            FrameEvent::Unit(unit) => handler.respond(&unit),
            FrameEvent::Overflow { limit } => {
                warn!(
                    target: LISTENER_TARGET,
                    connection = %self.id,
                    limit,
                    "discarding oversized request"
                );
                oversized(limit)
            }
        };
        match encode(&response) {
            Ok(bytes) => self.outbox.extend_from_slice(&bytes),
            Err(error) => warn!(
                target: LISTENER_TARGET,
                connection = %self.id,
                error = %error,
                "failed to encode response"
            ),
        }
    }

    /// Writes pending output until the socket would block. Returns the
    /// number of bytes written.
    fn flush_outbox(&mut self) -> io::Result<usize> {
        let mut written = 0;
        while written < self.outbox.len() {
            match self.stream.write(&self.outbox[written..]) {
                Ok(0) => {
                    self.outbox.drain(..written);
                    return Err(io::Error::from(io::ErrorKind::WriteZero));
                }
                Ok(count) => written += count,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
        self.outbox.drain(..written);
        if written > 0 {
            self.stream.flush()?;
        }
        Ok(written)
    }

    fn log_socket_error(&self, operation: &'static str, error: &io::Error) {
        warn!(
            target: LISTENER_TARGET,
            connection = %self.id,
            peer = %self.peer,
            operation,
            error = %error,
            "connection error"
        );
    }
}

fn oversized(limit: usize) -> Response {
    Rejection {
        id: serde_json::Value::Null,
        error: ProtocolError::Oversized { limit },
    }
    .into_response()
}
