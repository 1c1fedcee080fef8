//! Method resolution, invocation, and result classification.
//!
//! The dispatcher resolves a method in the registry, coerces the parameters
//! against the registry's declared types, runs the procedure, and classifies
//! the returned value. It has no knowledge of the transport, so the whole
//! request lifecycle can be exercised from raw bytes to response envelope.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use sockrpc_types::{Request, Response, ResultType};
use tracing::debug;

use super::coerce::{TypedValue, coerce};
use super::errors::DispatchError;
use super::registry::{MethodRecord, Registry};
use super::request::{decode_request, recover_id};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Value returned by a procedure together with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Procedure result.
    pub results: Value,
    /// Runtime classification of `results`.
    pub result_type: ResultType,
}

/// Resolves and invokes registered methods.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Registry backing this dispatcher.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches `method` with raw positional parameters.
    ///
    /// # Errors
    ///
    /// Returns `MethodNotFound`, `ArityMismatch`, `TypeError`,
    /// `InvalidArgument`, or `HandlerFailure` depending on the stage that
    /// failed.
    pub fn dispatch(&self, method: &str, params: &[Value]) -> Result<Dispatched, DispatchError> {
        let record = self.registry.lookup(method)?;
        let typed = coerce(record.name(), record.param_types(), params)?;
        let results = invoke_isolated(record, &typed)?;
        let result_type = classify(&results);
        Ok(Dispatched {
            results,
            result_type,
        })
    }

    /// Dispatches a decoded request.
    ///
    /// Caller-declared parameter types are only compared against the
    /// registry for diagnostics; coercion always follows the registry.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn handle(&self, request: &Request) -> Result<Dispatched, DispatchError> {
        if let Ok(record) = self.registry.lookup(&request.method) {
            note_declared_types(record, request);
        }
        self.dispatch(&request.method, &request.params)
    }

    /// Runs the whole request lifecycle on raw bytes.
    ///
    /// Always yields exactly one response envelope. The request id is echoed
    /// when it could be recovered, otherwise the response carries `null`.
    pub fn respond(&self, raw: &[u8]) -> Response {
        let request = match decode_request(raw) {
            Ok(request) => request,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "rejected malformed request");
                return Response::error(error.to_string(), recover_id(raw));
            }
        };

        match self.handle(&request) {
            Ok(Dispatched {
                results,
                result_type,
            }) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %request.method,
                    id = %request.id,
                    %result_type,
                    "request succeeded"
                );
                Response::success(results, result_type, request.id)
            }
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %request.method,
                    id = %request.id,
                    kind = %error.kind(),
                    %error,
                    "request failed"
                );
                Response::error(error.to_string(), request.id)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::builtin())
    }
}

/// Classifies a procedure result.
///
/// Booleans are checked before numbers so they are never reported as `int`.
pub fn classify(value: &Value) -> ResultType {
    match value {
        Value::Bool(_) => ResultType::Bool,
        Value::Number(number) if number.is_i64() || number.is_u64() => ResultType::Int,
        Value::Number(_) => ResultType::Float,
        Value::String(_) => ResultType::Str,
        Value::Array(_) => ResultType::List,
        Value::Null | Value::Object(_) => ResultType::Unknown,
    }
}

/// Invokes a procedure, converting a panic into a handler failure.
fn invoke_isolated(record: &MethodRecord, params: &[TypedValue]) -> Result<Value, DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(|| record.invoke(params))).unwrap_or_else(|payload| {
        Err(DispatchError::handler_failure(
            record.name(),
            panic_message(payload.as_ref()),
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "procedure panicked".to_owned()
    }
}

fn note_declared_types(record: &MethodRecord, request: &Request) {
    if request.param_types.is_empty() || request.param_types == record.param_types() {
        return;
    }
    debug!(
        target: DISPATCH_TARGET,
        method = record.name(),
        declared = ?request.param_types,
        expected = ?record.param_types(),
        "ignoring caller-declared parameter types"
    );
}

#[cfg(test)]
mod tests;
