//! Tests for the socket listener.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use conduit_config::ListenEndpoint;
use rstest::{fixture, rstest};

use super::{ConnectionOptions, CountingHandler, ListenerError, RecordingReporter, SocketListener};
use crate::health::HealthReporter;

#[fixture]
fn ephemeral() -> ListenEndpoint {
    ListenEndpoint::new("127.0.0.1", 0, 1)
}

fn options() -> ConnectionOptions {
    ConnectionOptions {
        max_unframed_bytes: 1024,
        drain_timeout: Duration::from_millis(200),
    }
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

fn free_port_run(length: u16) -> (u16, Vec<TcpListener>) {
    for _ in 0..20 {
        let first = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe");
        let base = first.local_addr().expect("probe addr").port();
        if base.checked_add(length).is_none() {
            continue;
        }
        let mut holders = vec![first];
        for offset in 1..length {
            match TcpListener::bind(("127.0.0.1", base + offset)) {
                Ok(holder) => holders.push(holder),
                Err(_) => break,
            }
        }
        if holders.len() == usize::from(length) {
            return (base, holders);
        }
    }
    panic!("could not reserve {length} consecutive ports");
}

#[rstest]
fn serves_units_from_several_clients(ephemeral: ListenEndpoint) {
    let listener = SocketListener::bind(&ephemeral).expect("bind listener");
    let addr = listener.local_addr();
    let (count, handler) = CountingHandler::new();
    let reporter: Arc<dyn HealthReporter> = Arc::new(RecordingReporter::default());
    let handle = listener
        .start(handler, options(), reporter)
        .expect("start listener");

    let mut first = TcpStream::connect(addr).expect("connect first client");
    let mut second = TcpStream::connect(addr).expect("connect second client");
    first.write_all(b"{}\n{}\n").expect("write first");
    second.write_all(b"{}\n").expect("write second");

    assert!(wait_for_count(&count, 3), "expected three units");
    let mut line = String::new();
    BufReader::new(&mut second)
        .read_line(&mut line)
        .expect("read response");
    assert!(line.contains("\"result\""));

    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn shutdown_closes_connections(ephemeral: ListenEndpoint) {
    let listener = SocketListener::bind(&ephemeral).expect("bind listener");
    let addr = listener.local_addr();
    let (_, handler) = CountingHandler::new();
    let reporter = Arc::new(RecordingReporter::default());
    let handle = listener
        .start(handler, options(), Arc::clone(&reporter) as Arc<dyn HealthReporter>)
        .expect("start listener");

    let client = TcpStream::connect(addr).expect("connect client");
    let deadline = Instant::now() + Duration::from_secs(2);
    while reporter.events().is_empty() {
        assert!(Instant::now() < deadline, "connection was never registered");
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.shutdown();
    handle.join().expect("join listener");
    drop(client);

    assert_eq!(reporter.events(), vec!["opened", "closed"]);
    assert!(TcpStream::connect(addr).is_err(), "port should be released");
}

#[test]
fn falls_back_past_occupied_ports() {
    let (base, mut holders) = free_port_run(2);
    holders.truncate(1);
    let endpoint = ListenEndpoint::new("127.0.0.1", base, 2);

    let listener = SocketListener::bind(&endpoint).expect("bind fallback port");
    assert_eq!(listener.local_addr().port(), base + 1);
}

#[test]
fn reports_exhausted_range() {
    let (base, _holders) = free_port_run(2);
    let endpoint = ListenEndpoint::new("127.0.0.1", base, 2);

    let error = SocketListener::bind(&endpoint).expect_err("range should be exhausted");
    assert!(matches!(error, ListenerError::Exhausted { .. }), "{error}");
}

#[rstest]
#[case::wildcard("0.0.0.0")]
#[case::documentation("192.0.2.1")]
fn rejects_non_loopback_hosts(#[case] host: &str) {
    let endpoint = ListenEndpoint::new(host, 0, 1);
    let error = SocketListener::bind(&endpoint).expect_err("non-loopback host should fail");
    assert!(matches!(error, ListenerError::NonLoopback { .. }), "{error}");
}
