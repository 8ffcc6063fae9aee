//! JSON-RPC method dispatch.
//!
//! Requests arrive as framed units from the transport. The [`Dispatcher`]
//! decodes each unit, resolves the method name against the fixed table in
//! [`MethodName`], validates its params into a typed [`Method`], and invokes
//! the matching executor operation. Every unit produces exactly one
//! [`crate::protocol::Response`].
//!
//! ## Results
//!
//! Most methods return a bare JSON value (string, boolean or array of
//! strings). The long-running triggers return an object carrying the
//! advisory duration currently recorded for the method:
//!
//! ```json
//! {"success":true,"message":"Build started. This operation may take up to 1200 seconds.","timeoutInfo":"Call getMethodMetadata() for expected operation durations"}
//! ```
//!
//! ## Errors
//!
//! Unknown methods and parameter mismatches share code `-32601`; the message
//! tells them apart.

mod errors;
mod handler;
mod method;
mod response;
mod router;

pub use self::errors::DispatchError;
pub use self::method::{
    LoadSessionParams, Method, MethodName, OpenFileParams, SetMethodMetadataParams,
    SwitchToBuildConfigParams,
};
pub use self::router::Dispatcher;
