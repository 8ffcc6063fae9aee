//! Transport adapter for the dispatcher.

use crate::protocol::Response;
use crate::transport::RequestHandler;

use super::router::Dispatcher;

impl RequestHandler for Dispatcher {
    fn respond(&mut self, unit: &[u8]) -> Response {
        self.handle_unit(unit)
    }
}
