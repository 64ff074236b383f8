//! Error types for typed-query.
//!
//! `ClientError` is what a database client reports; `QueryError` is what the
//! executor and its helpers hand back to callers.

use thiserror::Error;

/// Errors raised by a [`QueryClient`](crate::client::QueryClient) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The connection dropped or could not be established. Worth one retry.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A required single-row query matched nothing.
    #[error("Query returned no data")]
    NoData,

    /// Any other failure reported by the database.
    #[error("Query error: {0}")]
    Query(String),
}

impl ClientError {
    /// Creates a connection failure with the given message.
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Returns true for the transient error class the executor retries on.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

/// Main error type for typed-query operations.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Invalid client handle or method selector at construction time.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error from the underlying client, passed through unchanged.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// `parse` was called before any result was stored.
    #[error("Query result is empty")]
    EmptyResult,

    /// The stored payload does not fit the requested type.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    /// Configuration errors (unreadable file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (runtime setup and similar).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Creates an invalid-argument error with the given message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "Invalid Argument",
            Self::Client(ClientError::ConnectionFailed(_)) => "Connection Error",
            Self::Client(_) => "Query Error",
            Self::EmptyResult => "Empty Result",
            Self::Decode(_) => "Decode Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using QueryError.
pub type Result<T> = std::result::Result<T, QueryError>;
