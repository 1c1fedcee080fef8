//! Shared configuration for the sockrpc daemon and command-line client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path` or `SOCKRPC_CONFIG_PATH`), then
//! `SOCKRPC_*` environment variables, then command-line flags.

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_IO_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_SOCKET_PATH,
    default_log_filter, default_log_filter_string, default_log_format, default_socket_path,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketPreparationError, prepare_socket_directory};

/// Resolved configuration shared by the daemon and the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SOCKRPC")]
pub struct Config {
    /// Filesystem path of the daemon's Unix domain socket.
    #[ortho_config(default = defaults::default_socket_path())]
    pub socket_path: Utf8PathBuf,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Per-connection read/write deadline in milliseconds; zero disables it.
    #[ortho_config(default = defaults::DEFAULT_IO_TIMEOUT_MS)]
    pub io_timeout_ms: u64,
    /// Upper bound on the size of a single inbound request.
    #[ortho_config(default = defaults::DEFAULT_MAX_REQUEST_BYTES)]
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Path of the daemon socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        self.socket_path.as_path()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Read/write deadline applied to each connection, if any.
    #[must_use]
    pub const fn io_timeout(&self) -> Option<Duration> {
        if self.io_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.io_timeout_ms))
        }
    }

    /// Maximum accepted request size in bytes. Never zero.
    #[must_use]
    pub fn max_request_bytes(&self) -> usize {
        self.max_request_bytes.max(1)
    }

    /// Ensures the socket's parent directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the directory cannot be
    /// created or the path has no parent.
    pub fn prepare_socket_directory(&self) -> Result<(), SocketPreparationError> {
        prepare_socket_directory(self.socket_path())
    }
}
