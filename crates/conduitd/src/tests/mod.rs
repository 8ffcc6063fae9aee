//! Test suites spanning bootstrap, the wire protocol and the server lifecycle.

mod support;
