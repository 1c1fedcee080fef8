use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Socket path used when nothing else is configured.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/rpc_socket";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default per-connection read/write deadline.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;

/// Default bound on a single inbound request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Default socket path for the daemon.
pub fn default_socket_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_SOCKET_PATH)
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
