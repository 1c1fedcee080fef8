//! Connection handler that answers one request per connection.
//!
//! This module provides the `DispatchConnectionHandler` which implements the
//! `ConnectionHandler` trait from the transport layer. It reads a single
//! bounded request, runs it through the [`Dispatcher`], writes exactly one
//! response, and lets the stream drop, which closes the connection.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use serde::de::IgnoredAny;
use serde_json::Value;
use sockrpc_config::Config;
use tracing::{debug, warn};

use crate::transport::ConnectionHandler;

use super::dispatcher::{DISPATCH_TARGET, Dispatcher};
use super::errors::DispatchError;
use super::response::ResponseWriter;

const READ_CHUNK_BYTES: usize = 1024;

/// Per-connection resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Largest accepted request in bytes.
    pub max_request_bytes: usize,
    /// Read and write deadline, if any.
    pub io_timeout: Option<Duration>,
}

impl ConnectionLimits {
    /// Derives the limits from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_request_bytes: config.max_request_bytes(),
            io_timeout: config.io_timeout(),
        }
    }
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Connection handler that decodes, dispatches, and answers requests.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    dispatcher: Dispatcher,
    limits: ConnectionLimits,
}

impl DispatchConnectionHandler {
    /// Creates a handler around a dispatcher.
    pub const fn new(dispatcher: Dispatcher, limits: ConnectionLimits) -> Self {
        Self { dispatcher, limits }
    }

    /// Serves one request on an arbitrary byte stream.
    ///
    /// Application-level failures are answered with an error response.
    /// Transport failures are returned without writing anything further.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Io` when reading or writing fails.
    pub fn serve<S: Read + Write>(&self, stream: &mut S) -> Result<(), DispatchError> {
        let raw = match read_request(stream, self.limits.max_request_bytes) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return Ok(());
            }
            Err(error) if error.is_reportable() => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request");
                return ResponseWriter::new(stream).write_error(&error, Value::Null);
            }
            Err(error) => return Err(error),
        };

        let response = self.dispatcher.respond(&raw);
        ResponseWriter::new(stream).write_response(&response)
    }

    fn apply_deadlines(&self, stream: &UnixStream) -> io::Result<()> {
        stream.set_read_timeout(self.limits.io_timeout)?;
        stream.set_write_timeout(self.limits.io_timeout)
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, mut stream: UnixStream) {
        if let Err(error) = self.apply_deadlines(&stream) {
            warn!(target: DISPATCH_TARGET, %error, "failed to apply connection deadlines");
            return;
        }
        if let Err(error) = self.serve(&mut stream) {
            warn!(target: DISPATCH_TARGET, %error, "connection closed after transport error");
        }
    }
}

/// Reads one bounded request from the stream.
///
/// A request ends at the first newline, at end of stream, or as soon as the
/// bytes received form a complete JSON value, whichever comes first.
/// Returns `Ok(None)` if the client disconnects without sending data.
///
/// # Errors
///
/// Returns `DispatchError::RequestTooLarge` once more than `max_bytes` arrive
/// without completing a request, not counting a trailing newline, or
/// `DispatchError::Io` if reading fails.
pub fn read_request<R: Read>(
    stream: &mut R,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK_BYTES];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        let Some(received) = chunk.get(..bytes_read).filter(|bytes| !bytes.is_empty()) else {
            return Ok((!buffer.is_empty()).then_some(buffer));
        };

        if let Some(newline_pos) = received.iter().position(|b| *b == b'\n') {
            // The terminator does not count toward the limit.
            enforce_limit(buffer.len() + newline_pos, max_bytes)?;
            buffer.extend(received.iter().take(newline_pos + 1));
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len(), max_bytes)?;
        if holds_complete_value(&buffer) {
            return Ok(Some(buffer));
        }
    }
}

/// Whether the buffer starts with a complete JSON value, or with input that
/// can never become one.
fn holds_complete_value(buffer: &[u8]) -> bool {
    let mut values = serde_json::Deserializer::from_slice(buffer).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => true,
        Some(Err(error)) => !error.is_eof(),
        None => false,
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Enforces the maximum request size limit.
const fn enforce_limit(size: usize, max_bytes: usize) -> Result<(), DispatchError> {
    if size > max_bytes {
        return Err(DispatchError::request_too_large(size, max_bytes));
    }
    Ok(())
}
