//! Error types for method lookup and parameter validation.

use thiserror::Error;

use super::method::MethodName;
use crate::protocol::error_code;

/// Errors surfaced while resolving a request to a [`super::Method`].
///
/// The `Display` text is the message sent to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The method name is not in the method table.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// Name supplied by the client.
        method: String,
    },
    /// The params were missing, not an object, or lacked a required key.
    #[error("Invalid parameters for {method}")]
    InvalidParams {
        /// Method whose params were rejected.
        method: MethodName,
    },
}

impl DispatchError {
    /// Creates an unknown method error.
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid params error.
    #[must_use]
    pub const fn invalid_params(method: MethodName) -> Self {
        Self::InvalidParams { method }
    }

    /// JSON-RPC code reported for this error.
    ///
    /// Parameter mismatches share the unknown-method code so existing
    /// clients see a single failure channel.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::UnknownMethod { .. } | Self::InvalidParams { .. } => {
                error_code::METHOD_NOT_FOUND
            }
        }
    }
}
