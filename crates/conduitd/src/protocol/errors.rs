//! Envelope-level failures detected before dispatch.

use thiserror::Error;

use super::message::error_code;

/// Errors raised while framing or decoding a request unit.
///
/// The `Display` text is the message sent to the client.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The unit was not valid JSON.
    #[error("Parse error")]
    Parse {
        /// Underlying JSON error, kept for diagnostics only.
        #[source]
        source: serde_json::Error,
    },
    /// The connection buffered more unframed bytes than allowed.
    #[error("Parse error: request exceeds {limit} bytes")]
    Oversized {
        /// Configured cap on unframed bytes.
        limit: usize,
    },
    /// The document parsed but was not a JSON object.
    #[error("Invalid Request")]
    NotAnObject,
    /// The `jsonrpc` member was missing or not `"2.0"`.
    #[error("Invalid Request: jsonrpc must be '2.0'")]
    WrongVersion,
    /// The `method` member was missing, empty or not a string.
    #[error("Invalid Request: method is required")]
    MissingMethod,
}

impl ProtocolError {
    /// JSON-RPC code reported for this error.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse { .. } | Self::Oversized { .. } => error_code::PARSE_ERROR,
            Self::NotAnObject | Self::WrongVersion | Self::MissingMethod => {
                error_code::INVALID_REQUEST
            }
        }
    }
}
