//! Blocking client for the sockrpc daemon.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sockrpc_config::Config;
use sockrpc_types::{Request, Response, TypeTag};

use crate::errors::ClientError;
use crate::transport::{connect, read_response, send_request};

/// Client that opens one connection per call.
#[derive(Debug)]
pub struct RpcClient {
    socket_path: Utf8PathBuf,
    timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client for the socket at `socket_path`.
    pub fn new(socket_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a client from resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.socket_path()).with_timeout(config.io_timeout())
    }

    /// Sets the read/write deadline applied to each call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Socket path this client dials.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Calls `method` and returns its results.
    ///
    /// Each call carries a fresh, increasing integer id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Remote`] when the daemon answers with an error
    /// envelope, or another [`ClientError`] for transport failures.
    pub fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        param_types: Vec<TypeTag>,
    ) -> Result<Value, ClientError> {
        let id = Value::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(method, params, param_types, id.clone());

        let mut stream = connect(&self.socket_path, self.timeout)?;
        send_request(&mut stream, &request)?;
        let response = read_response(&stream)?;
        match response {
            Response::Success(success) if success.id != id => Err(ClientError::IdMismatch {
                expected: id,
                actual: success.id,
            }),
            Response::Success(success) => Ok(success.results),
            Response::Error(error) => Err(ClientError::Remote {
                message: error.error,
            }),
        }
    }

    /// Largest integer not greater than `x`.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub fn floor(&self, x: f64) -> Result<i64, ClientError> {
        self.typed("floor", vec![json!(x)], vec![TypeTag::Float])
    }

    /// Real `n`-th root of `x`.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub fn nroot(&self, x: i64, n: f64) -> Result<f64, ClientError> {
        self.typed(
            "nroot",
            vec![json!(x), json!(n)],
            vec![TypeTag::Int, TypeTag::Float],
        )
    }

    /// `text` with its characters in reverse order.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub fn reverse(&self, text: &str) -> Result<String, ClientError> {
        self.typed("reverse", vec![json!(text)], vec![TypeTag::Str])
    }

    /// Whether `left` and `right` are case-insensitive anagrams.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub fn valid_anagram(&self, left: &str, right: &str) -> Result<bool, ClientError> {
        self.typed(
            "validAnagram",
            vec![json!(left), json!(right)],
            vec![TypeTag::Str, TypeTag::Str],
        )
    }

    /// `items` in ascending order.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub fn sort(&self, items: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        self.typed("sort", vec![Value::Array(items)], vec![TypeTag::List])
    }

    fn typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
        param_types: Vec<TypeTag>,
    ) -> Result<T, ClientError> {
        let results = self.call(method, params, param_types)?;
        serde_json::from_value(results.clone())
            .map_err(|source| ClientError::UnexpectedResult { results, source })
    }
}
