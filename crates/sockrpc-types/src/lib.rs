//! Wire envelopes shared by the sockrpc daemon and its clients.
//!
//! Every exchange over the daemon socket is a single JSON object in each
//! direction. Requests name a method and carry positional parameters; the
//! daemon answers with exactly one of two response shapes:
//!
//! ```json
//! {"results": 3, "result_type": "int", "id": 1}
//! {"error": "method 'bogus' not found", "id": 1}
//! ```
//!
//! The types here only describe the envelopes. Coercion, dispatch, and the
//! procedures themselves live in the daemon crate.

mod request;
mod response;
mod tags;

pub use request::Request;
pub use response::{ErrorResponse, Response, SuccessResponse};
pub use tags::{ResultType, TypeTag};
