//! The method registry.
//!
//! The registry maps method names to their records. It is built once at
//! startup, never mutated, and shared read-only between connections.

use std::collections::HashMap;

use serde_json::Value;
use sockrpc_types::TypeTag;

use super::coerce::TypedValue;
use super::errors::DispatchError;
use super::procedures::{self, ProcedureError};

/// The fixed set of callable procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// `floor(x: float) -> int`
    Floor,
    /// `nroot(x: int, n: float) -> float`
    Nroot,
    /// `reverse(s: str) -> str`
    Reverse,
    /// `validAnagram(a: str, b: str) -> bool`
    ValidAnagram,
    /// `sort(items: list) -> list`
    Sort,
}

impl Procedure {
    /// Every built-in procedure.
    pub const ALL: [Self; 5] = [
        Self::Floor,
        Self::Nroot,
        Self::Reverse,
        Self::ValidAnagram,
        Self::Sort,
    ];

    /// Wire name of the procedure.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Nroot => "nroot",
            Self::Reverse => "reverse",
            Self::ValidAnagram => "validAnagram",
            Self::Sort => "sort",
        }
    }

    /// Positional parameter types the procedure expects.
    pub const fn param_types(self) -> &'static [TypeTag] {
        match self {
            Self::Floor => &[TypeTag::Float],
            Self::Nroot => &[TypeTag::Int, TypeTag::Float],
            Self::Reverse => &[TypeTag::Str],
            Self::ValidAnagram => &[TypeTag::Str, TypeTag::Str],
            Self::Sort => &[TypeTag::List],
        }
    }

    /// Runs the procedure on parameters coerced against
    /// [`Procedure::param_types`].
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidArgument` when the procedure rejects its
    /// input and `DispatchError::HandlerFailure` when the parameters do not
    /// match the signature.
    pub fn invoke(self, params: &[TypedValue]) -> Result<Value, DispatchError> {
        let outcome = match (self, params) {
            (Self::Floor, [TypedValue::Float(x)]) => procedures::floor(*x).map(Value::from),
            (Self::Nroot, [TypedValue::Int(x), TypedValue::Float(n)]) => {
                procedures::nroot(*x, *n).map(Value::from)
            }
            (Self::Reverse, [TypedValue::Str(text)]) => {
                Ok(Value::String(procedures::reverse(text)))
            }
            (Self::ValidAnagram, [TypedValue::Str(left), TypedValue::Str(right)]) => {
                Ok(Value::Bool(procedures::valid_anagram(left, right)))
            }
            (Self::Sort, [TypedValue::List(items)]) => procedures::sort(items).map(Value::Array),
            _ => {
                return Err(DispatchError::handler_failure(
                    self.name(),
                    "parameters do not match the procedure signature",
                ));
            }
        };
        outcome.map_err(|ProcedureError::InvalidArgument(message)| {
            DispatchError::invalid_argument(self.name(), message)
        })
    }
}

/// Registry entry describing one callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRecord {
    name: &'static str,
    param_types: &'static [TypeTag],
    procedure: Procedure,
}

impl MethodRecord {
    /// Builds the record for a procedure.
    pub const fn new(procedure: Procedure) -> Self {
        Self {
            name: procedure.name(),
            param_types: procedure.param_types(),
            procedure,
        }
    }

    /// Registered method name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared positional parameter types.
    pub const fn param_types(&self) -> &'static [TypeTag] {
        self.param_types
    }

    /// Procedure implementing the method.
    pub const fn procedure(&self) -> Procedure {
        self.procedure
    }

    /// Invokes the procedure with coerced parameters.
    ///
    /// # Errors
    ///
    /// See [`Procedure::invoke`].
    pub fn invoke(&self, params: &[TypedValue]) -> Result<Value, DispatchError> {
        self.procedure.invoke(params)
    }
}

/// Immutable mapping from method name to record.
#[derive(Debug, Clone)]
pub struct Registry {
    methods: HashMap<&'static str, MethodRecord>,
}

impl Registry {
    /// Builds the registry holding every built-in procedure.
    pub fn builtin() -> Self {
        Self::from_procedures(Procedure::ALL)
    }

    /// Builds a registry restricted to the given procedures.
    pub fn from_procedures(procedures: impl IntoIterator<Item = Procedure>) -> Self {
        let methods = procedures
            .into_iter()
            .map(|procedure| (procedure.name(), MethodRecord::new(procedure)))
            .collect();
        Self { methods }
    }

    /// Resolves a method by exact name.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MethodNotFound` when no method has that name.
    pub fn lookup(&self, name: &str) -> Result<&MethodRecord, DispatchError> {
        self.methods
            .get(name)
            .ok_or_else(|| DispatchError::method_not_found(name))
    }

    /// Registered method names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
