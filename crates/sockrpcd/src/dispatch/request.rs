//! Request decoding.
//!
//! Raw bytes are parsed into a [`Request`] envelope. Decoding happens in two
//! steps, first to a generic JSON value and then to the envelope, so the
//! correlation id can still be recovered from a request that fails schema
//! validation.

use serde_json::Value;
use sockrpc_types::Request;

use super::errors::DispatchError;

/// Parses raw request bytes into an envelope.
///
/// Trailing whitespace (including a newline delimiter) is ignored.
///
/// # Errors
///
/// Returns `DispatchError::MalformedRequest` if the input is empty, is not
/// valid JSON, is not a JSON object, or lacks a string `method` field.
pub fn decode_request(raw: &[u8]) -> Result<Request, DispatchError> {
    let trimmed = trim_trailing_whitespace(raw);
    if trimmed.is_empty() {
        return Err(DispatchError::malformed("empty request"));
    }

    let value: Value = serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
    if !value.is_object() {
        return Err(DispatchError::malformed("request must be a JSON object"));
    }
    serde_json::from_value(value).map_err(DispatchError::from_json_error)
}

/// Extracts the `id` field from a request that failed to decode.
///
/// Returns `null` when the input is not a JSON object.
pub fn recover_id(raw: &[u8]) -> Value {
    serde_json::from_slice::<Value>(trim_trailing_whitespace(raw))
        .ok()
        .and_then(|mut value| value.get_mut("id").map(Value::take))
        .unwrap_or(Value::Null)
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
