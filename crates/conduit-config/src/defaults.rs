//! Default values shared by the configuration loader and its callers.

use crate::endpoint::ListenEndpoint;
use crate::logging::LogFormat;

/// Loopback address the server binds to by default.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port probed first when the server starts.
pub const DEFAULT_PORT: u16 = 3001;

/// Number of consecutive ports probed, starting at the preferred port.
pub const DEFAULT_PORT_SPAN: u16 = 10;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Delay between session readiness checks, in milliseconds.
pub const DEFAULT_SESSION_POLL_INTERVAL_MS: u64 = 1_000;

/// Number of readiness checks performed before a session load gives up.
pub const DEFAULT_SESSION_POLL_ATTEMPTS: u32 = 15;

/// Upper bound on waiting for a privileged-context reply, in milliseconds.
pub const DEFAULT_HOST_REPLY_TIMEOUT_MS: u64 = 5_000;

/// Total wait granted to clients to close during shutdown, in milliseconds.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 3_000;

/// Largest unterminated request a connection may buffer.
pub const DEFAULT_MAX_UNFRAMED_BYTES: usize = 1024 * 1024;

/// Owned host value used where allocation is required (e.g. serde).
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default preferred port.
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default fallback span.
pub const fn default_port_span() -> u16 {
    DEFAULT_PORT_SPAN
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default delay between session readiness checks.
pub const fn default_session_poll_interval_ms() -> u64 {
    DEFAULT_SESSION_POLL_INTERVAL_MS
}

/// Default number of session readiness checks.
pub const fn default_session_poll_attempts() -> u32 {
    DEFAULT_SESSION_POLL_ATTEMPTS
}

/// Default privileged-context reply timeout.
pub const fn default_host_reply_timeout_ms() -> u64 {
    DEFAULT_HOST_REPLY_TIMEOUT_MS
}

/// Default shutdown drain budget.
pub const fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

/// Default cap on unframed bytes per connection.
pub const fn default_max_unframed_bytes() -> usize {
    DEFAULT_MAX_UNFRAMED_BYTES
}

/// Computes the default listen endpoint for the server.
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PORT_SPAN)
}
