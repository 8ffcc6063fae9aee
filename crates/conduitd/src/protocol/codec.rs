//! Decoding of request units and encoding of responses.

use serde_json::{Map, Value};

use super::JSONRPC_VERSION;
use super::errors::ProtocolError;
use super::message::{Request, Response};

/// A unit that failed envelope validation, with the `id` it carried.
#[derive(Debug)]
pub struct Rejection {
    /// Identifier extracted from the document, or `Null`.
    pub id: Value,
    /// Reason the unit was rejected.
    pub error: ProtocolError,
}

impl Rejection {
    fn new(id: Value, error: ProtocolError) -> Self {
        Self { id, error }
    }

    /// Converts the rejection into the error response sent to the client.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::failure(self.id, self.error.code(), self.error.to_string())
    }
}

/// Decodes and validates one framed unit.
///
/// # Errors
///
/// Returns a [`Rejection`] when the unit is not JSON, is not an object, or
/// lacks `jsonrpc: "2.0"` or a non-empty string `method`.
pub fn decode(unit: &[u8]) -> Result<Request, Rejection> {
    let value: Value = serde_json::from_slice(unit)
        .map_err(|source| Rejection::new(Value::Null, ProtocolError::Parse { source }))?;
    let Value::Object(object) = value else {
        return Err(Rejection::new(Value::Null, ProtocolError::NotAnObject));
    };
    validate_envelope(object)
}

fn validate_envelope(mut object: Map<String, Value>) -> Result<Request, Rejection> {
    let id = object.remove("id").unwrap_or(Value::Null);
    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(Rejection::new(id, ProtocolError::WrongVersion));
    }
    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(Rejection::new(id, ProtocolError::MissingMethod)),
    };
    Ok(Request {
        id,
        method,
        params: object.remove("params"),
    })
}

/// Encodes a response as one compact JSON line terminated by `\n`.
///
/// # Errors
///
/// Returns the serialisation error if the result value cannot be rendered.
pub fn encode(response: &Response) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    Ok(bytes)
}
