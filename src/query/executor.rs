//! Query execution with a single reconnect retry.
//!
//! Provides isolated query execution that can be tested independently of any
//! real database by plugging in [`MockQueryClient`](crate::client::MockQueryClient).

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::{ClientError, QueryArgs, QueryClient};
use crate::error::{QueryError, Result};
use crate::query::QueryMethod;

/// Payload that decodes to an absent value.
const NULL_PAYLOAD: &str = "null";

/// Runs queries against a borrowed client and keeps the last raw result.
///
/// ```ignore
/// let user: Option<User> = QueryExecutor::new(&client, QueryMethod::Single)?
///     .execute("SELECT id, name FROM users WHERE id = $1::uuid", &QueryArgs::new().arg(id))?
///     .parse()?;
/// ```
pub struct QueryExecutor<'a, C: QueryClient + ?Sized> {
    client: &'a C,
    method: QueryMethod,
    result: Option<String>,
}

impl<'a, C: QueryClient + ?Sized> QueryExecutor<'a, C> {
    /// Creates a new query executor.
    ///
    /// Fails with [`QueryError::InvalidArgument`] if the client handle is closed.
    pub fn new(client: &'a C, method: QueryMethod) -> Result<Self> {
        if client.is_closed() {
            return Err(QueryError::invalid_argument("client is closed"));
        }

        Ok(Self {
            client,
            method,
            result: None,
        })
    }

    /// Creates an executor using the default [`QueryMethod::Multiple`].
    pub fn multiple(client: &'a C) -> Result<Self> {
        Self::new(client, QueryMethod::default())
    }

    /// Creates an executor from a textual method name such as `"single_required"`.
    pub fn with_method_name(client: &'a C, method: &str) -> Result<Self> {
        let method = method.parse()?;
        Self::new(client, method)
    }

    /// The call shape this executor dispatches to.
    pub fn method(&self) -> QueryMethod {
        self.method
    }

    /// The raw payload stored by the last successful execute, if any.
    pub fn raw_result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Runs `query` through the selected call shape and stores its payload.
    ///
    /// A connection failure on the first attempt is retried once with the same
    /// arguments. Every other error, including a second connection failure,
    /// is returned as-is. On error the previously stored payload is kept.
    pub fn execute(&mut self, query: &str, args: &QueryArgs) -> Result<&mut Self> {
        match self.dispatch(query, args) {
            Err(ClientError::ConnectionFailed(reason)) => {
                warn!(method = %self.method, %reason, "Connection failed, retrying query once");
                self.dispatch(query, args)?;
            }
            other => other?,
        }
        Ok(self)
    }

    /// Decodes the stored payload into `T`.
    ///
    /// Returns `Ok(None)` for a `null` payload. The payload is left in place,
    /// so the same result can be parsed again, possibly into another type.
    /// An `Execute` call stores nothing, so parsing after it fails with
    /// [`QueryError::EmptyResult`].
    pub fn parse<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let raw = self.result.as_deref().ok_or(QueryError::EmptyResult)?;

        if raw == NULL_PAYLOAD {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(raw)?))
    }

    fn dispatch(&mut self, query: &str, args: &QueryArgs) -> std::result::Result<(), ClientError> {
        debug!(method = %self.method, "Dispatching query");

        self.result = match self.method {
            QueryMethod::Multiple => Some(self.client.query_json(query, args)?),
            QueryMethod::Single => Some(self.client.query_single_json(query, args)?),
            QueryMethod::SingleRequired => {
                Some(self.client.query_required_single_json(query, args)?)
            }
            QueryMethod::Execute => {
                self.client.execute(query)?;
                None
            }
        };
        Ok(())
    }
}
