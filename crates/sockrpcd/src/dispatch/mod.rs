//! JSON request dispatch for the procedure call service.
//!
//! This module implements the request lifecycle: a connection handler reads
//! one framed request, the codec decodes it into a [`sockrpc_types::Request`],
//! the dispatcher resolves the method in the [`Registry`], coerces parameters
//! against the registry's declared types, invokes the procedure, and the codec
//! encodes a single response envelope. The dispatcher integrates with the
//! transport layer via the `ConnectionHandler` trait.
//!
//! ## Protocol
//!
//! Clients send one JSON object per connection, optionally terminated by a
//! newline:
//!
//! ```json
//! {"method":"nroot","params":[27,3],"param_types":["int","float"],"id":1}
//! ```
//!
//! The daemon answers with exactly one object, either a success:
//!
//! ```json
//! {"results":3.0,"result_type":"float","id":1}
//! ```
//!
//! or an error:
//!
//! ```json
//! {"error":"method 'nope' not found","id":1}
//! ```
//!
//! and then closes the connection.

mod coerce;
mod dispatcher;
mod errors;
mod handler;
mod procedures;
mod registry;
mod request;
mod response;

pub use self::coerce::{TypedValue, coerce};
pub use self::dispatcher::{Dispatched, Dispatcher, classify};
pub use self::errors::{DispatchError, ErrorKind};
pub use self::handler::{ConnectionLimits, DispatchConnectionHandler, read_request};
pub use self::procedures::ProcedureError;
pub use self::registry::{MethodRecord, Procedure, Registry};
pub use self::request::{decode_request, recover_id};
pub use self::response::{ResponseWriter, encode_error, encode_response, encode_success};
