//! Error types for the client library and the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while calling the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The daemon socket could not be reached.
    #[error("failed to connect to daemon at {path}: {source}")]
    Connect {
        /// Socket path that was dialled.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The request could not be serialised.
    #[error("failed to serialise request: {0}")]
    SerialiseRequest(#[source] serde_json::Error),
    /// Writing the request failed.
    #[error("failed to send request to daemon: {0}")]
    SendRequest(#[source] io::Error),
    /// Reading the response failed.
    #[error("failed to read response from daemon: {0}")]
    ReadResponse(#[source] io::Error),
    /// The daemon closed the connection without answering.
    #[error("daemon closed the connection without a response")]
    EmptyResponse,
    /// The response was not a valid envelope.
    #[error("failed to parse daemon response: {0}")]
    ParseResponse(#[source] serde_json::Error),
    /// The response answered a different request.
    #[error("response id {actual} does not match request id {expected}")]
    IdMismatch {
        /// Id sent with the request.
        expected: Value,
        /// Id echoed by the daemon.
        actual: Value,
    },
    /// The daemon reported an error.
    #[error("{message}")]
    Remote {
        /// Message from the error envelope.
        message: String,
    },
    /// The result had an unexpected shape for the called method.
    #[error("unexpected result {results}: {source}")]
    UnexpectedResult {
        /// Result returned by the daemon.
        results: Value,
        /// Conversion error.
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Returns true when the failure means no daemon is listening.
    #[must_use]
    pub fn is_daemon_not_running(&self) -> bool {
        match self {
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("{flag} must be valid JSON: {source}")]
    InvalidJson {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{flag} must be a JSON array")]
    NotAnArray { flag: &'static str },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
