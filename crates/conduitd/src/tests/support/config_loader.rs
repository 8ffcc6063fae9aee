//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use conduit_config::Config;
use ortho_config::OrthoError;

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port with fast session polling.
pub struct TestConfigLoader;

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            port: 0,
            port_span: 1,
            session_poll_interval_ms: 10,
            session_poll_attempts: 3,
            drain_timeout_ms: 100,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing a malformed CLI argument.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("conduitd"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::from_args(args)
    }
}

/// Loader whose configuration parses but never checks session readiness.
pub struct InvalidConfigLoader;

impl ConfigLoader for InvalidConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            session_poll_attempts: 0,
            ..Config::default()
        })
    }
}
