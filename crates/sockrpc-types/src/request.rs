//! Request envelope.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::TypeTag;

/// A single call sent by a client.
///
/// Only `method` is required. Missing or `null` parameter lists decode as
/// empty and a missing `id` decodes as `null`. The type tags a caller sends
/// are advisory: the daemon always coerces against its own method schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Name of the procedure to invoke.
    pub method: String,
    /// Positional parameters.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<Value>,
    /// Caller-declared parameter types.
    #[serde(default, alias = "param_Types", deserialize_with = "null_as_empty")]
    pub param_types: Vec<TypeTag>,
    /// Opaque correlation token echoed in the response.
    #[serde(default)]
    pub id: Value,
}

impl Request {
    /// Builds a request with the given correlation token.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Vec<Value>,
        param_types: Vec<TypeTag>,
        id: Value,
    ) -> Self {
        Self {
            method: method.into(),
            params,
            param_types,
            id,
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
