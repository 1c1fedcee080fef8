//! Error types for socket listener operations.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Binding the socket path failed.
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Another process is serving the socket path.
    #[error("existing unix socket {path} is already in use")]
    InUse {
        /// Socket path.
        path: Utf8PathBuf,
    },
    /// The path exists but is not a socket.
    #[error("unix socket path {path} is not a socket")]
    NotSocket {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Reading metadata for an existing path failed.
    #[error("failed to read metadata for unix socket {path}: {source}")]
    Metadata {
        /// Socket path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Probing an existing socket failed unexpectedly.
    #[error("failed to connect to existing unix socket {path}: {source}")]
    Connect {
        /// Socket path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Removing a stale socket failed.
    #[error("failed to remove stale unix socket {path}: {source}")]
    Cleanup {
        /// Socket path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Accepting a connection failed with a non-transient error.
    #[error("socket accept failed: {source}")]
    Accept {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The accept loop thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
