//! Parameter coercion against a method's declared types.
//!
//! Coercion is positional and side-effect free: each raw JSON value is
//! converted according to the tag at the same position, or rejected.

use serde_json::Value;
use sockrpc_types::TypeTag;

use super::errors::DispatchError;
use super::procedures::kind_name;

/// A parameter converted to the type its procedure expects.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Coerced integer.
    Int(i64),
    /// Coerced float.
    Float(f64),
    /// Coerced text.
    Str(String),
    /// Array passed through unchanged.
    List(Vec<Value>),
    /// Parameter with no declared type, passed through unchanged.
    Untyped(Value),
}

/// Coerces `raw` positionally against `declared`.
///
/// # Errors
///
/// Returns `DispatchError::ArityMismatch` when the lengths differ and
/// `DispatchError::TypeError` for the first parameter that cannot be
/// converted.
pub fn coerce(
    method: &str,
    declared: &[TypeTag],
    raw: &[Value],
) -> Result<Vec<TypedValue>, DispatchError> {
    if declared.len() != raw.len() {
        return Err(DispatchError::arity_mismatch(
            method,
            declared.len(),
            raw.len(),
        ));
    }

    declared
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (tag, value))| {
            coerce_value(*tag, value).ok_or_else(|| DispatchError::TypeError {
                method: method.to_owned(),
                index,
                expected: *tag,
                actual: kind_name(value),
                value: value.to_string(),
            })
        })
        .collect()
}

fn coerce_value(tag: TypeTag, value: &Value) -> Option<TypedValue> {
    match tag {
        TypeTag::Int => to_int(value).map(TypedValue::Int),
        TypeTag::Float => to_float(value).map(TypedValue::Float),
        TypeTag::Str => Some(TypedValue::Str(to_text(value))),
        TypeTag::List => match value {
            Value::Array(items) => Some(TypedValue::List(items.clone())),
            _ => None,
        },
        TypeTag::Untyped => Some(TypedValue::Untyped(value.clone())),
    }
}

// 2^63 as f64; finite floats below -2^63 or at/above 2^63 overflow i64.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Integers pass through, floats truncate toward zero, booleans become 0
/// or 1, and strings must spell a base-10 integer.
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number.as_i64().or_else(|| {
            let float = number.as_f64()?;
            let truncated = float.trunc();
            (number.is_f64() && truncated >= -I64_LIMIT && truncated < I64_LIMIT)
                .then_some(truncated as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Strings are taken verbatim; everything else uses its JSON text.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
