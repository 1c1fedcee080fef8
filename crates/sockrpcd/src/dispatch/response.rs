//! Response encoding and the connection-side writer.
//!
//! The `encode_*` helpers produce a single self-contained JSON object with no
//! framing. [`ResponseWriter`] adds the newline terminator used on the wire.

use std::io::Write;

use serde_json::Value;
use sockrpc_types::{Response, ResultType};

use super::errors::DispatchError;

/// Serializes a success envelope.
///
/// # Errors
///
/// Returns `DispatchError::SerializeResponse` if serialization fails.
pub fn encode_success(
    results: Value,
    result_type: ResultType,
    id: Value,
) -> Result<String, DispatchError> {
    encode_response(&Response::success(results, result_type, id))
}

/// Serializes an error envelope.
///
/// # Errors
///
/// Returns `DispatchError::SerializeResponse` if serialization fails.
pub fn encode_error(message: &str, id: Value) -> Result<String, DispatchError> {
    encode_response(&Response::error(message, id))
}

/// Serializes either envelope.
///
/// # Errors
///
/// Returns `DispatchError::SerializeResponse` if serialization fails.
pub fn encode_response(response: &Response) -> Result<String, DispatchError> {
    Ok(serde_json::to_string(response)?)
}

/// Writer that frames encoded responses onto a stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a response as one newline-terminated line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing, or flushing fails.
    pub fn write_response(&mut self, response: &Response) -> Result<(), DispatchError> {
        let encoded = encode_response(response)?;
        self.writer.write_all(encoded.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes an error envelope for `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError, id: Value) -> Result<(), DispatchError> {
        self.write_response(&Response::error(error.to_string(), id))
    }
}
