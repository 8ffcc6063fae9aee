//! Newline-delimited JSON-RPC 2.0 wire protocol.
//!
//! Each request is one JSON document terminated by `\n`. The [`LineFramer`]
//! splits a connection's byte stream into request units, [`decode`] validates
//! a unit against the JSON-RPC envelope, and [`encode`] renders a
//! [`Response`] as a single compact line.

mod codec;
mod errors;
mod framing;
mod message;

pub use self::codec::{Rejection, decode, encode};
pub use self::errors::ProtocolError;
pub use self::framing::{FrameEvent, LineFramer};
pub use self::message::{Outcome, Request, Response, RpcError, error_code};

/// Protocol version string carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";
