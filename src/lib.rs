//! typed-query - query execution with retry-on-reconnect and typed results.
//!
//! A [`QueryExecutor`] borrows a [`QueryClient`], runs one query shape against
//! it (retrying once if the connection dropped) and decodes the stored JSON
//! text into any `serde` type.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;

pub use client::{ClientError, MockQueryClient, PostgresClient, QueryArgs, QueryClient};
pub use error::{QueryError, Result};
pub use model::{Lazy, Model};
pub use query::{QueryExecutor, QueryMethod};
