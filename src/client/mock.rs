//! Mock query client for testing.
//!
//! Replays scripted responses in order and records every call it receives.

use super::{ClientError, QueryArgs, QueryClient};
use crate::query::QueryMethod;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call seen by [`MockQueryClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Which call shape was used.
    pub method: QueryMethod,
    /// The query text.
    pub query: String,
    /// The arguments passed along (always empty for `Execute`).
    pub args: QueryArgs,
}

/// A mock client that returns scripted results.
///
/// When the script runs out, each shape falls back to an "empty database"
/// answer: `[]`, `null`, [`ClientError::NoData`] and success respectively.
#[derive(Debug, Default)]
pub struct MockQueryClient {
    responses: Mutex<VecDeque<Result<String, ClientError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    closed: bool,
}

impl MockQueryClient {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose handle reports itself as closed.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// Queues a successful payload for the next call.
    pub fn push_response(&self, payload: impl Into<String>) -> &Self {
        lock(&self.responses).push_back(Ok(payload.into()));
        self
    }

    /// Queues an error for the next call.
    pub fn push_error(&self, error: ClientError) -> &Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// All calls seen so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls seen so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn respond(
        &self,
        method: QueryMethod,
        query: &str,
        args: &QueryArgs,
    ) -> Result<String, ClientError> {
        lock(&self.calls).push(RecordedCall {
            method,
            query: query.to_string(),
            args: args.clone(),
        });

        if let Some(scripted) = lock(&self.responses).pop_front() {
            return scripted;
        }

        match method {
            QueryMethod::Multiple => Ok("[]".to_string()),
            QueryMethod::Single => Ok("null".to_string()),
            QueryMethod::SingleRequired => Err(ClientError::NoData),
            QueryMethod::Execute => Ok(String::new()),
        }
    }
}

impl QueryClient for MockQueryClient {
    fn query_json(&self, query: &str, args: &QueryArgs) -> Result<String, ClientError> {
        self.respond(QueryMethod::Multiple, query, args)
    }

    fn query_single_json(&self, query: &str, args: &QueryArgs) -> Result<String, ClientError> {
        self.respond(QueryMethod::Single, query, args)
    }

    fn query_required_single_json(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> Result<String, ClientError> {
        self.respond(QueryMethod::SingleRequired, query, args)
    }

    fn execute(&self, query: &str) -> Result<(), ClientError> {
        self.respond(QueryMethod::Execute, query, &QueryArgs::new())
            .map(|_| ())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// A panicking test thread must not hide the calls recorded before it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
