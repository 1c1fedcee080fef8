//! The built-in procedures.
//!
//! Every procedure is a pure function of its already-coerced parameters.
//! Semantic rejections are reported as [`ProcedureError::InvalidArgument`].

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

/// Failure raised by a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcedureError {
    /// The input is outside the procedure's domain.
    #[error("{0}")]
    InvalidArgument(String),
}

impl ProcedureError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

// 2^63; every f64 at or above this bound overflows i64.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Largest integer not greater than `x`.
pub fn floor(x: f64) -> Result<i64, ProcedureError> {
    if !x.is_finite() {
        return Err(ProcedureError::invalid(format!(
            "cannot take the floor of {x}"
        )));
    }
    let floored = x.floor();
    if floored < -I64_UPPER_BOUND || floored >= I64_UPPER_BOUND {
        return Err(ProcedureError::invalid(format!(
            "floor of {x} does not fit in a 64-bit integer"
        )));
    }
    Ok(floored as i64)
}

/// Real `n`-th root of `x`.
pub fn nroot(x: i64, n: f64) -> Result<f64, ProcedureError> {
    if n == 0.0 {
        return Err(ProcedureError::invalid("the zeroth root is undefined"));
    }
    if !n.is_finite() {
        return Err(ProcedureError::invalid(format!("root degree {n} is not finite")));
    }

    let base = x as f64;
    let integral_degree = n.fract() == 0.0;
    let root = if base < 0.0 {
        if !integral_degree {
            return Err(ProcedureError::invalid(format!(
                "{x} has no real root of fractional degree {n}"
            )));
        }
        if n % 2.0 == 0.0 {
            return Err(ProcedureError::invalid(format!(
                "{x} has no real root of even degree {n}"
            )));
        }
        -(-base).powf(n.recip())
    } else {
        base.powf(n.recip())
    };

    if !root.is_finite() {
        return Err(ProcedureError::invalid(format!(
            "root of degree {n} of {x} is not finite"
        )));
    }
    Ok(snap_exact_root(root, base, n, integral_degree))
}

/// Rounds `root` to the nearest integer when that integer is the exact root.
fn snap_exact_root(root: f64, base: f64, n: f64, integral_degree: bool) -> f64 {
    if !integral_degree || n < 1.0 || n > f64::from(i32::MAX) {
        return root;
    }
    let candidate = root.round();
    if candidate.powi(n as i32) == base {
        candidate
    } else {
        root
    }
}

/// Reverses the Unicode scalar values of `input`.
pub fn reverse(input: &str) -> String {
    input.chars().rev().collect()
}

/// Whether `left` and `right` hold the same characters, ignoring case.
pub fn valid_anagram(left: &str, right: &str) -> bool {
    folded_characters(left) == folded_characters(right)
}

fn folded_characters(input: &str) -> Vec<char> {
    let mut characters: Vec<char> = input.to_lowercase().chars().collect();
    characters.sort_unstable();
    characters
}

/// Stable ascending sort of strings, numbers, or nested lists.
///
/// Booleans order as the integers 0 and 1. Mixing element kinds that have
/// no mutual ordering fails.
pub fn sort(items: &[Value]) -> Result<Vec<Value>, ProcedureError> {
    let mut sorted = items.to_vec();
    let mut failure = None;
    sorted.sort_by(|left, right| compare(left, right, &mut failure));
    match failure {
        Some(error) => Err(error),
        None => Ok(sorted),
    }
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Bool(flag) => Some(Numeric::Int(i128::from(*flag))),
        Value::Number(number) => number
            .as_i64()
            .map(|int| Numeric::Int(i128::from(int)))
            .or_else(|| number.as_u64().map(|int| Numeric::Int(i128::from(int))))
            .or_else(|| number.as_f64().map(Numeric::Float)),
        _ => None,
    }
}

/// Total order over JSON values.
///
/// Pairs with no natural ordering fall back to ranking by kind, so the
/// comparator stays consistent for `sort_by`; the first such pair is
/// recorded in `failure`.
fn compare(left: &Value, right: &Value, failure: &mut Option<ProcedureError>) -> Ordering {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Array(left), Value::Array(right)) => {
            for (left_item, right_item) in left.iter().zip(right) {
                let ordering = compare(left_item, right_item, failure);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left.len().cmp(&right.len())
        }
        _ => match (numeric(left), numeric(right)) {
            (Some(left), Some(right)) => compare_numbers(left, right),
            _ => {
                if failure.is_none() {
                    *failure = Some(ProcedureError::invalid(format!(
                        "cannot order {} against {}",
                        kind_name(left),
                        kind_name(right)
                    )));
                }
                kind_rank(left).cmp(&kind_rank(right))
            }
        },
    }
}

const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) | Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Array(_) => 2,
        Value::Null => 3,
        Value::Object(_) => 4,
    }
}

fn compare_numbers(left: Numeric, right: Numeric) -> Ordering {
    match (left, right) {
        (Numeric::Int(left), Numeric::Int(right)) => left.cmp(&right),
        (Numeric::Int(left), Numeric::Float(right)) => compare_int_float(left, right),
        (Numeric::Float(left), Numeric::Int(right)) => compare_int_float(right, left).reverse(),
        (Numeric::Float(left), Numeric::Float(right)) => left.total_cmp(&right),
    }
}

// 2^127; every finite f64 outside this magnitude lies beyond any i128.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// Exact comparison of an integer with a finite float.
fn compare_int_float(int: i128, float: f64) -> Ordering {
    if float >= I128_BOUND {
        return Ordering::Less;
    }
    if float < -I128_BOUND {
        return Ordering::Greater;
    }
    let whole = float.floor();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal if float > whole => Ordering::Less,
        ordering => ordering,
    }
}

/// JSON type name used in diagnostics.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
