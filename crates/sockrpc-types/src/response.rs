//! Response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResultType;

/// Successful call outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuccessResponse {
    /// Value returned by the procedure.
    pub results: Value,
    /// Classification of `results`.
    pub result_type: ResultType,
    /// Correlation token copied from the request.
    pub id: Value,
}

/// Failed call outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
    /// Correlation token copied from the request, or `null` when it could
    /// not be recovered.
    pub id: Value,
}

/// Either response shape; exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// The call succeeded.
    Success(SuccessResponse),
    /// The call failed.
    Error(ErrorResponse),
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn success(results: Value, result_type: ResultType, id: Value) -> Self {
        Self::Success(SuccessResponse {
            results,
            result_type,
            id,
        })
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(message: impl Into<String>, id: Value) -> Self {
        Self::Error(ErrorResponse {
            error: message.into(),
            id,
        })
    }

    /// Returns the correlation token carried by either shape.
    #[must_use]
    pub const fn id(&self) -> &Value {
        match self {
            Self::Success(success) => &success.id,
            Self::Error(error) => &error.id,
        }
    }

    /// Converts the response into the call result.
    ///
    /// # Errors
    ///
    /// Returns the error message when the response is the error shape.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Self::Success(success) => Ok(success.results),
            Self::Error(error) => Err(error.error),
        }
    }
}
