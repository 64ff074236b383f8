//! PostgreSQL query client implementation.
//!
//! Provides `PostgresClient`, a blocking [`QueryClient`] built on sqlx. Each
//! call shape wraps the caller's SQL in a CTE and lets Postgres render the
//! rows as JSON text.

use crate::client::{ClientError, QueryArgs, QueryClient};
use crate::config::ConnectionConfig;
use crate::error::{QueryError, Result};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, Postgres};
use sqlx::query::QueryScalar;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// How long to wait for a free connection before giving up.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL query client.
///
/// Owns a single-threaded tokio runtime and blocks on it for every call, so
/// it must not be used from inside another async runtime.
#[derive(Debug)]
pub struct PostgresClient {
    runtime: Runtime,
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresClient {
    /// Connects using the given configuration.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QueryError::internal(format!("Failed to start runtime: {e}")))?;

        info!("Connecting to {}", config.display_string());
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
                    .connect(&conn_str),
            )
            .map_err(map_sqlx_error)?;
        debug!("Successfully connected to database");

        Ok(Self {
            runtime,
            pool,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }

    /// Connects using a `postgres://` connection string.
    pub fn connect_url(url: &str) -> Result<Self> {
        Self::connect(&ConnectionConfig::from_connection_string(url)?)
    }

    /// Closes every connection. Later calls fail and `is_closed` turns true.
    pub fn close(&self) {
        self.runtime.block_on(self.pool.close());
    }

    fn run<T, F>(&self, future: F) -> std::result::Result<T, ClientError>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        self.runtime
            .block_on(async { tokio::time::timeout(self.query_timeout, future).await })
            .map_err(|_| {
                ClientError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })?
            .map_err(map_sqlx_error)
    }

    /// Fetches the row of `query` as a JSON object, failing on more than one row.
    fn fetch_single(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> std::result::Result<Option<String>, ClientError> {
        check_args(args)?;
        let sql = single_sql(query);
        let rows: Vec<String> = self.run(
            bind_all(sqlx::query_scalar(&sql), &args.positional).fetch_all(&self.pool),
        )?;

        if rows.len() > 1 {
            return Err(ClientError::query(format!(
                "Expected at most one row, got {}",
                rows.len()
            )));
        }
        Ok(rows.into_iter().next())
    }
}

impl QueryClient for PostgresClient {
    fn query_json(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> std::result::Result<String, ClientError> {
        check_args(args)?;
        let sql = multiple_sql(query);
        self.run(bind_all(sqlx::query_scalar(&sql), &args.positional).fetch_one(&self.pool))
    }

    fn query_single_json(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> std::result::Result<String, ClientError> {
        Ok(self
            .fetch_single(query, args)?
            .unwrap_or_else(|| "null".to_string()))
    }

    fn query_required_single_json(
        &self,
        query: &str,
        args: &QueryArgs,
    ) -> std::result::Result<String, ClientError> {
        self.fetch_single(query, args)?.ok_or(ClientError::NoData)
    }

    fn execute(&self, query: &str) -> std::result::Result<(), ClientError> {
        let result = self.run(sqlx::raw_sql(query).execute(&self.pool))?;
        debug!("Statement affected {} rows", result.rows_affected());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Wraps `query` so it returns all rows as one JSON array (`[]` when empty).
///
/// The query sits on its own lines so a trailing `--` comment cannot swallow the wrapper.
fn multiple_sql(query: &str) -> String {
    format!(
        "WITH q AS (\n{}\n) SELECT coalesce(json_agg(q), '[]'::json)::text FROM q",
        trim_statement(query)
    )
}

/// Wraps `query` so each row comes back as a JSON object.
fn single_sql(query: &str) -> String {
    format!(
        "WITH q AS (\n{}\n) SELECT row_to_json(q)::text FROM q LIMIT 2",
        trim_statement(query)
    )
}

fn trim_statement(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

fn check_args(args: &QueryArgs) -> std::result::Result<(), ClientError> {
    if !args.named.is_empty() {
        return Err(ClientError::query(
            "Named arguments are not supported by PostgreSQL; use positional $n parameters",
        ));
    }

    // BIGINT is the widest integer type sqlx binds natively.
    match args
        .positional
        .iter()
        .position(|arg| matches!(arg, Value::Number(n) if n.as_i64().is_none() && n.is_u64()))
    {
        Some(index) => Err(ClientError::query(format!(
            "Argument ${} does not fit in BIGINT; pass it as a string",
            index + 1
        ))),
        None => Ok(()),
    }
}

/// Binds JSON values as `$1..$n`, mapping scalars to their native Postgres types.
///
/// Callers run [`check_args`] first, so every integer here fits in `i64`.
fn bind_all<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    args: &'q [Value],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(sqlx::types::Json(other)),
        };
    }
    query
}

/// Classifies sqlx errors into the client error taxonomy.
fn map_sqlx_error(error: sqlx::Error) -> ClientError {
    match error {
        sqlx::Error::RowNotFound => ClientError::NoData,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
            ClientError::connection_failed(error.to_string())
        }
        other if is_disconnect(&other) || is_transient_error(&other) => {
            ClientError::connection_failed(other.to_string())
        }
        other => ClientError::query(format_query_error(&other)),
    }
}

/// Checks whether the server reported that it dropped or refused the connection.
fn is_disconnect(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db_error| db_error.code())
        .is_some_and(|code| is_disconnect_code(&code))
}

/// SQLSTATE class 08 (connection exception) plus the shutdown codes of class 57.
fn is_disconnect_code(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

/// Checks whether an error message describes a dropped or unreachable connection.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if error.as_database_error().is_some() {
        return false;
    }

    let error_str = error.to_string().to_lowercase();
    [
        "connection refused",
        "connection reset",
        "connection closed",
        "broken pipe",
        "timed out",
        "temporarily unavailable",
    ]
    .iter()
    .any(|needle| error_str.contains(needle))
}

/// Formats a query error, adding Postgres detail and hint lines when present.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
