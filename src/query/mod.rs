//! Query execution and typed result parsing.
//!
//! This module holds the executor that drives a client through one query
//! shape and the selector for that shape.

pub mod executor;
pub mod method;

pub use executor::QueryExecutor;
pub use method::QueryMethod;
