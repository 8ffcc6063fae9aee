//! Request handling seam between the transport and the dispatcher.

use crate::protocol::Response;

/// Produces one response per framed request unit.
///
/// The network thread owns the handler and calls it serially, in arrival
/// order, for every connection.
pub trait RequestHandler: Send + 'static {
    /// Answers a single unit. Implementations should avoid panicking.
    fn respond(&mut self, unit: &[u8]) -> Response;
}

impl<F> RequestHandler for F
where
    F: FnMut(&[u8]) -> Response + Send + 'static,
{
    fn respond(&mut self, unit: &[u8]) -> Response {
        self(unit)
    }
}
