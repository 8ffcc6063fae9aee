//! Test helpers for the transport module.

use std::net::SocketAddr;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use conduit_config::{Config, ListenEndpoint};
use serde_json::json;

use super::RequestHandler;
use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::protocol::Response;
use crate::server::StartError;

/// Answers every unit with its running count.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Box<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Box::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl RequestHandler for CountingHandler {
    fn respond(&mut self, _unit: &[u8]) -> Response {
        let seen = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        Response::success(json!(null), json!(seen))
    }
}

/// Records connection events so tests can assert on them.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn record(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl HealthReporter for RecordingReporter {
    fn bootstrap_starting(&self) {}

    fn bootstrap_succeeded(&self, _config: &Config) {}

    fn bootstrap_failed(&self, _error: &BootstrapError) {}

    fn server_starting(&self, _endpoint: &ListenEndpoint) {}

    fn server_started(&self, _addr: SocketAddr) {}

    fn server_start_failed(&self, _error: &StartError) {}

    fn server_stopped(&self, _port: u16) {}

    fn connection_opened(&self, _peer: SocketAddr) {
        self.record(String::from("opened"));
    }

    fn connection_closed(&self, _peer: SocketAddr) {
        self.record(String::from("closed"));
    }
}
