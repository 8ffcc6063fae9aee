//! Request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JSONRPC_VERSION;

/// JSON-RPC error codes emitted by the server.
pub mod error_code {
    /// The unit was not valid JSON, or exceeded the framing limit.
    pub const PARSE_ERROR: i64 = -32_700;
    /// The document was not a valid request envelope.
    pub const INVALID_REQUEST: i64 = -32_600;
    /// The method is unknown or its parameters do not match.
    pub const METHOD_NOT_FOUND: i64 = -32_601;
}

/// A validated request ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Identifier echoed verbatim in the response. `Null` when absent.
    pub id: Value,
    /// Non-empty method name.
    pub method: String,
    /// Raw parameters, when supplied.
    pub params: Option<Value>,
}

/// Error payload carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric JSON-RPC error code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Successful result value.
    #[serde(rename = "result")]
    Result(Value),
    /// Error payload.
    #[serde(rename = "error")]
    Error(RpcError),
}

/// Response envelope written back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Identifier copied from the request.
    pub id: Value,
    /// Result or error payload, flattened into the envelope.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Error(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Returns the result value for successful responses.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// Returns the error payload for failed responses.
    #[must_use]
    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}
