//! Local procedure call daemon served over a Unix domain socket.
//!
//! The daemon binds a socket path taken from [`sockrpc_config::Config`],
//! reads one JSON request per connection, dispatches it to one of a fixed set
//! of procedures (`floor`, `nroot`, `reverse`, `validAnagram`, `sort`), and
//! answers with exactly one JSON response before closing the connection.
//!
//! The request lifecycle lives in [`dispatch`] and has no dependency on the
//! transport, so it can be driven directly from raw bytes:
//!
//! ```
//! use sockrpcd::dispatch::Dispatcher;
//!
//! let response = Dispatcher::default()
//!     .respond(br#"{"method":"reverse","params":["hello"],"id":1}"#);
//! assert_eq!(response.into_result(), Ok(serde_json::json!("olleh")));
//! ```
//!
//! [`run_daemon`] wires the lifecycle to a socket listener and to process
//! signals: startup binds the socket (replacing a stale one), and shutdown
//! stops the accept loop, drains in-flight connections, and removes the
//! socket file.

mod bootstrap;
pub mod dispatch;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use process::{
    LaunchError, LaunchPlan, ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal,
    run_daemon, run_daemon_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
