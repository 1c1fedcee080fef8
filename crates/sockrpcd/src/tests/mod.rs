//! Test suites for the sockrpc daemon.

mod socket_behaviour;
mod support;
