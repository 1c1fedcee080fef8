//! Parameter type tags and result type classifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a positional parameter.
///
/// The four named tags select a coercion rule. Any other declared value is
/// kept as [`TypeTag::Untyped`] and passes the parameter through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum TypeTag {
    /// Signed 64-bit integer.
    Int,
    /// Double precision float.
    Float,
    /// Text.
    Str,
    /// JSON array.
    List,
    /// Any other declared tag; no validation is performed.
    Untyped,
}

impl TypeTag {
    /// Returns the wire spelling of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Untyped => "any",
        }
    }
}

impl From<Value> for TypeTag {
    fn from(value: Value) -> Self {
        match value.as_str() {
            Some("int") => Self::Int,
            Some("float") => Self::Float,
            Some("str") => Self::Str,
            Some("list") => Self::List,
            _ => Self::Untyped,
        }
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.as_str().to_owned()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Runtime classification of a procedure result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Integral number.
    Int,
    /// Floating-point number.
    Float,
    /// Text.
    Str,
    /// JSON array.
    List,
    /// Boolean; never folded into [`ResultType::Int`].
    Bool,
    /// Anything else (null or object).
    Unknown,
}

impl ResultType {
    /// Returns the wire spelling of the result type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Bool => "bool",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
