//! Line-oriented JSON-RPC client and a running server for end-to-end tests.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use conduit_config::ListenEndpoint;
use serde_json::{Value, json};

use crate::executor::SessionPollPolicy;
use crate::health::HealthReporter;
use crate::host::{
    HostJournal, InMemoryHost, PrivilegedContext, ProjectSpec, TargetSpec,
    spawn_privileged_context,
};
use crate::server::{Server, ServerOptions};
use crate::transport::ConnectionOptions;

use super::RecordingHealthReporter;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Host with one buildable project and a `nightly` session.
#[must_use]
pub fn sample_host() -> InMemoryHost {
    let project = |name: &str| {
        ProjectSpec::new(name).with_target(
            TargetSpec::new("Desktop")
                .with_build_configs(&["Debug", "Release"])
                .with_run_config(name),
        )
    };
    InMemoryHost::new()
        .with_version("13.0.2")
        .with_project(project("app"))
        .with_session("nightly", vec![project("nightly-app")])
}

/// Server bound to an ephemeral loopback port, backed by a privileged thread.
pub struct TestServer {
    pub server: Server,
    pub journal: HostJournal,
    pub reporter: Arc<RecordingHealthReporter>,
    context: Option<PrivilegedContext<InMemoryHost>>,
}

impl TestServer {
    /// Builds a stopped server around `host`.
    pub fn new(host: InMemoryHost) -> Self {
        Self::with_options(host, Self::options(1024 * 1024))
    }

    /// Builds a stopped server with explicit options.
    pub fn with_options(host: InMemoryHost, options: ServerOptions) -> Self {
        let journal = host.journal();
        let (handle, context) = spawn_privileged_context(host, Duration::from_secs(2))
            .expect("spawn privileged context");
        let reporter = Arc::new(RecordingHealthReporter::default());
        let server = Server::new(
            options,
            handle,
            Arc::clone(&reporter) as Arc<dyn HealthReporter>,
        );
        Self {
            server,
            journal,
            reporter,
            context: Some(context),
        }
    }

    /// Options binding any free loopback port with fast polling.
    pub fn options(max_unframed_bytes: usize) -> ServerOptions {
        ServerOptions {
            endpoint: ListenEndpoint::new("127.0.0.1", 0, 1),
            connection: ConnectionOptions {
                max_unframed_bytes,
                drain_timeout: Duration::from_millis(200),
            },
            session_poll: SessionPollPolicy::new(Duration::from_millis(10), 5),
        }
    }

    /// Starts the server on an ephemeral port and returns its address.
    pub fn start(&mut self) -> SocketAddr {
        self.server.start(0).expect("start server");
        self.server.local_addr().expect("running server address")
    }

    /// Opens a client connection to the running server.
    pub fn connect(&self) -> RpcClient {
        RpcClient::connect(self.server.local_addr().expect("server should be running"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.stop();
        drop(self.context.take());
    }
}

/// Blocking newline-delimited JSON-RPC client.
pub struct RpcClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl RpcClient {
    /// Connects to `addr` with a bounded read timeout.
    pub fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).expect("connect to server");
        writer
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = BufReader::new(writer.try_clone().expect("clone client stream"));
        Self { writer, reader }
    }

    /// Writes raw bytes without adding a terminator.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write to server");
        self.writer.flush().expect("flush client stream");
    }

    /// Reads one response line and parses it.
    pub fn read_response(&mut self) -> Value {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read response line");
        assert!(read > 0, "server closed the connection before responding");
        assert!(line.ends_with('\n'), "response should be newline terminated");
        serde_json::from_str(&line).expect("response should be JSON")
    }

    /// Sends a request with numeric `id` and returns the response.
    pub fn call(&mut self, id: u64, method: &str, params: Option<Value>) -> Value {
        let mut request = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            request["params"] = params;
        }
        let mut line = request.to_string();
        line.push('\n');
        self.send_raw(line.as_bytes());
        self.read_response()
    }

    /// Whether the server has closed the connection.
    pub fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(self.reader.read_line(&mut line), Ok(0))
    }
}
