//! Error types for request decoding and dispatch failures.
//!
//! Each variant maps to one failure class reported back to the caller. The
//! display representation is the human-readable message placed in the
//! `error` field of the response envelope.

use std::fmt;
use std::io;

use sockrpc_types::TypeTag;
use thiserror::Error;

/// Errors surfaced while decoding, dispatching, or answering a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request could not be parsed or lacks a required field.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Description of the problem.
        message: String,
        /// Parser error, when one was raised.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Request exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes received before the limit tripped.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// Method name is not registered.
    #[error("method '{method}' not found")]
    MethodNotFound {
        /// Requested method name.
        method: String,
    },

    /// Parameter count disagrees with the method's schema.
    #[error("method '{method}' expects {expected} parameter(s), got {actual}")]
    ArityMismatch {
        /// Resolved method name.
        method: String,
        /// Parameter count declared by the registry.
        expected: usize,
        /// Parameter count supplied by the caller.
        actual: usize,
    },

    /// A parameter could not be coerced to its declared type.
    #[error("parameter {index} of '{method}' expects {expected}, got {actual} {value}")]
    TypeError {
        /// Resolved method name.
        method: String,
        /// Zero-based parameter position.
        index: usize,
        /// Type declared by the registry.
        expected: TypeTag,
        /// JSON type name of the supplied value.
        actual: &'static str,
        /// Supplied value rendered as JSON.
        value: String,
    },

    /// The procedure rejected semantically invalid input.
    #[error("invalid argument for '{method}': {message}")]
    InvalidArgument {
        /// Resolved method name.
        method: String,
        /// Reason given by the procedure.
        message: String,
    },

    /// The procedure failed for any other reason.
    #[error("method '{method}' failed: {message}")]
    HandlerFailure {
        /// Resolved method name.
        method: String,
        /// Failure description.
        message: String,
    },

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Failure classes reported by [`DispatchError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input not parseable or missing a required field.
    MalformedRequest,
    /// Name not in the registry.
    MethodNotFound,
    /// Parameter count mismatch.
    ArityMismatch,
    /// A parameter could not be coerced.
    TypeError,
    /// A procedure rejected its input.
    InvalidArgument,
    /// Any other procedure failure.
    HandlerFailure,
    /// Read, write, or accept failure; never sent to the client.
    TransportError,
}

impl ErrorKind {
    /// Returns the canonical name of the failure class.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "MalformedRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::ArityMismatch => "ArityMismatch",
            Self::TypeError => "TypeError",
            Self::InvalidArgument => "InvalidArgument",
            Self::HandlerFailure => "HandlerFailure",
            Self::TransportError => "TransportError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl DispatchError {
    /// Returns the failure class of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest { .. } | Self::RequestTooLarge { .. } => {
                ErrorKind::MalformedRequest
            }
            Self::MethodNotFound { .. } => ErrorKind::MethodNotFound,
            Self::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Self::TypeError { .. } => ErrorKind::TypeError,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::HandlerFailure { .. } | Self::SerializeResponse(_) => ErrorKind::HandlerFailure,
            Self::Io(_) => ErrorKind::TransportError,
        }
    }

    /// Returns true when the error must be answered with an error response.
    pub const fn is_reportable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::TransportError)
    }

    /// Creates a malformed request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a request too large error.
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Creates a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Creates an arity mismatch error.
    pub fn arity_mismatch(method: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            method: method.into(),
            expected,
            actual,
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Creates a handler failure error.
    pub fn handler_failure(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailure {
            method: method.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::malformed(DispatchError::malformed("x"), ErrorKind::MalformedRequest)]
    #[case::too_large(DispatchError::request_too_large(10, 5), ErrorKind::MalformedRequest)]
    #[case::not_found(DispatchError::method_not_found("x"), ErrorKind::MethodNotFound)]
    #[case::arity(DispatchError::arity_mismatch("x", 1, 2), ErrorKind::ArityMismatch)]
    #[case::invalid(DispatchError::invalid_argument("x", "y"), ErrorKind::InvalidArgument)]
    #[case::failure(DispatchError::handler_failure("x", "y"), ErrorKind::HandlerFailure)]
    #[case::io(
        DispatchError::Io(io::Error::from(io::ErrorKind::BrokenPipe)),
        ErrorKind::TransportError
    )]
    fn classifies_errors(#[case] error: DispatchError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
        assert_eq!(error.is_reportable(), expected != ErrorKind::TransportError);
    }

    #[test]
    fn type_error_names_the_offending_type() {
        let error = DispatchError::TypeError {
            method: "sort".to_owned(),
            index: 0,
            expected: TypeTag::List,
            actual: "str",
            value: "\"abc\"".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "parameter 0 of 'sort' expects list, got str \"abc\""
        );
    }
}
