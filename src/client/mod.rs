//! Database client abstraction for typed-query.
//!
//! The executor only needs four call shapes from a client, each returning the
//! result as JSON text. Any backend that can produce that implements
//! [`QueryClient`].

mod mock;
mod postgres;

pub use mock::{MockQueryClient, RecordedCall};
pub use postgres::PostgresClient;

pub use crate::error::ClientError;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Trait defining the call shapes a database client must offer.
///
/// Every call blocks until the database answers. A dropped connection must be
/// reported as [`ClientError::ConnectionFailed`] so callers can retry it.
pub trait QueryClient: Send + Sync {
    /// Runs a query and returns every matching row as a JSON array.
    fn query_json(&self, query: &str, args: &QueryArgs) -> Result<String, ClientError>;

    /// Runs a query expected to match at most one row.
    ///
    /// Returns the row as a JSON object, or the text `null` when nothing matched.
    fn query_single_json(&self, query: &str, args: &QueryArgs) -> Result<String, ClientError>;

    /// Runs a query expected to match exactly one row.
    ///
    /// Zero rows is [`ClientError::NoData`].
    fn query_required_single_json(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> Result<String, ClientError>;

    /// Executes a statement for its side effects only.
    fn execute(&self, query: &str) -> Result<(), ClientError>;

    /// Returns true once the handle can no longer serve queries.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Positional and named query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryArgs {
    /// Arguments bound by position (`$1`, `$2`, ...).
    #[serde(default)]
    pub positional: Vec<Value>,

    /// Arguments bound by name.
    #[serde(default)]
    pub named: BTreeMap<String, Value>,
}

impl QueryArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument list from positional values.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing any previous value under that name.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Returns true if no arguments are set.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}
