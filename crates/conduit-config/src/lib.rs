//! Shared configuration for the conduit control-plane server.
//!
//! Values are layered by `ortho_config`: built-in defaults first, then an
//! optional TOML file named by `--config-path` (or `CONDUIT_CONFIG_PATH`),
//! then `CONDUIT_*` environment variables, and finally command-line flags.
//! The server library consumes the resolved [`Config`] through typed
//! accessors so durations and endpoints are never re-derived by callers.

mod defaults;
mod endpoint;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_HOST_REPLY_TIMEOUT_MS, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_UNFRAMED_BYTES, DEFAULT_PORT, DEFAULT_PORT_SPAN, DEFAULT_SESSION_POLL_ATTEMPTS,
    DEFAULT_SESSION_POLL_INTERVAL_MS, default_drain_timeout_ms, default_host,
    default_host_reply_timeout_ms, default_listen_endpoint, default_log_filter,
    default_log_filter_string, default_log_format, default_max_unframed_bytes, default_port,
    default_port_span, default_session_poll_attempts, default_session_poll_interval_ms,
};
pub use endpoint::ListenEndpoint;
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for the server and the `conduitd` binary.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "CONDUIT")]
pub struct Config {
    /// Loopback host the listener binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port probed first at startup.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of consecutive ports probed, including the preferred one.
    #[serde(default = "default_port_span")]
    pub port_span: u16,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Delay before each session readiness check, in milliseconds.
    #[serde(default = "default_session_poll_interval_ms")]
    pub session_poll_interval_ms: u64,
    /// Number of readiness checks before a session load reports failure.
    #[serde(default = "default_session_poll_attempts")]
    pub session_poll_attempts: u32,
    /// Upper bound on waiting for a privileged-context reply, in milliseconds.
    #[serde(default = "default_host_reply_timeout_ms")]
    pub host_reply_timeout_ms: u64,
    /// Total wait granted to clients to close during shutdown, in milliseconds.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Largest unterminated request a connection may buffer.
    #[serde(default = "default_max_unframed_bytes")]
    pub max_unframed_bytes: usize,
    /// Optional JSON manifest seeding the standalone in-memory host.
    #[serde(default)]
    pub workspace_manifest: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            port_span: default_port_span(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            session_poll_interval_ms: default_session_poll_interval_ms(),
            session_poll_attempts: default_session_poll_attempts(),
            host_reply_timeout_ms: default_host_reply_timeout_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
            max_unframed_bytes: default_max_unframed_bytes(),
            workspace_manifest: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments, environment and files.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn from_process() -> Result<Self, Arc<OrthoError>> {
        Self::from_args(std::env::args_os())
    }

    /// Loads configuration using an explicit argument list.
    ///
    /// The first item is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn from_args<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        Self::load_from_iter(args)
    }

    /// Endpoint the listener binds, including its fallback span.
    #[must_use]
    pub fn listen_endpoint(&self) -> ListenEndpoint {
        ListenEndpoint::new(self.host.clone(), self.port, self.port_span)
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Delay before each session readiness check.
    #[must_use]
    pub const fn session_poll_interval(&self) -> Duration {
        Duration::from_millis(self.session_poll_interval_ms)
    }

    /// Number of session readiness checks.
    #[must_use]
    pub const fn session_poll_attempts(&self) -> u32 {
        self.session_poll_attempts
    }

    /// Upper bound on waiting for a privileged-context reply.
    #[must_use]
    pub const fn host_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.host_reply_timeout_ms)
    }

    /// Total shutdown drain budget.
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Cap on buffered unframed bytes per connection.
    #[must_use]
    pub const fn max_unframed_bytes(&self) -> usize {
        self.max_unframed_bytes
    }

    /// Manifest path for the standalone host, when configured.
    #[must_use]
    pub fn workspace_manifest(&self) -> Option<&camino::Utf8Path> {
        self.workspace_manifest.as_deref()
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.session_poll_attempts == 0 {
            return Err(ConfigError::ZeroPollAttempts);
        }
        if self.max_unframed_bytes == 0 {
            return Err(ConfigError::ZeroUnframedLimit);
        }
        Ok(())
    }
}

/// Invariant violations detected by [`Config::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The listen host was blank.
    #[error("listen host must not be empty")]
    EmptyHost,
    /// Session loads would never check readiness.
    #[error("session_poll_attempts must be at least 1")]
    ZeroPollAttempts,
    /// Every request would overflow the framer.
    #[error("max_unframed_bytes must be greater than zero")]
    ZeroUnframedLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_loopback_3001() {
        let config = Config::default();
        let endpoint = config.listen_endpoint();
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.preferred_port(), 3001);
        assert_eq!(endpoint.candidate_ports().last(), Some(3010));
    }

    #[test]
    fn defaults_poll_fifteen_times_a_second_apart() {
        let config = Config::default();
        assert_eq!(config.session_poll_attempts(), 15);
        assert_eq!(config.session_poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn validate_rejects_blank_host() {
        let config = Config {
            host: "  ".to_owned(),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyHost));
    }

    #[test]
    fn validate_rejects_zero_poll_attempts() {
        let config = Config {
            session_poll_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollAttempts));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert_eq!(Config::default().validate(), Ok(()));
    }
}
