use std::fmt;

use serde::{Deserialize, Serialize};

/// Loopback TCP endpoint with a bounded range of fallback ports.
///
/// The listener binds the preferred port first and then walks upwards through
/// the remaining candidates until one succeeds. Port `0` asks the operating
/// system for an ephemeral port and therefore yields a single candidate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenEndpoint {
    host: String,
    preferred_port: u16,
    span: u16,
}

impl ListenEndpoint {
    /// Builds an endpoint probing `span` consecutive ports from `preferred_port`.
    ///
    /// A span of zero is treated as one so the preferred port is always tried.
    #[must_use]
    pub fn new(host: impl Into<String>, preferred_port: u16, span: u16) -> Self {
        Self {
            host: host.into(),
            preferred_port,
            span: span.max(1),
        }
    }

    /// Host name or address to bind.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// First port probed.
    #[must_use]
    pub const fn preferred_port(&self) -> u16 {
        self.preferred_port
    }

    /// Number of consecutive ports probed.
    #[must_use]
    pub const fn span(&self) -> u16 {
        self.span
    }

    /// Returns a copy of the endpoint starting at a different port.
    #[must_use]
    pub fn with_preferred_port(&self, preferred_port: u16) -> Self {
        Self {
            host: self.host.clone(),
            preferred_port,
            span: self.span,
        }
    }

    /// Ports to try, in order. Never wraps past `u16::MAX`.
    pub fn candidate_ports(&self) -> impl Iterator<Item = u16> + '_ {
        let span = if self.preferred_port == 0 { 1 } else { self.span };
        (0..span).map_while(|offset| self.preferred_port.checked_add(offset))
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tcp://{}:{}", self.host, self.preferred_port)?;
        if self.span > 1 && self.preferred_port != 0 {
            write!(formatter, " (+{} fallback ports)", self.span - 1)?;
        }
        Ok(())
    }
}
