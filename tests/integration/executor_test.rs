//! Executor integration tests.
//!
//! Exercises the retry policy and the typed parse contract through the
//! public API, with a scripted mock client standing in for the database.

use pretty_assertions::assert_eq;
use serde::Deserialize;
use typed_query::{
    ClientError, MockQueryClient, QueryArgs, QueryError, QueryExecutor, QueryMethod,
};
use uuid::Uuid;

const USER_ID: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: Uuid,
}

fn reset() -> ClientError {
    ClientError::connection_failed("connection reset by peer")
}

#[test]
fn test_retry_once_after_connection_failure() {
    for method in QueryMethod::ALL {
        let client = MockQueryClient::new();
        client.push_error(reset()).push_response("[]");

        let mut executor = QueryExecutor::new(&client, method).unwrap();
        let result = executor.execute("SELECT 1", &QueryArgs::new().arg(1));

        assert!(result.is_ok(), "{method} should succeed on retry");
        assert_eq!(client.call_count(), 2);
    }
}

#[test]
fn test_retry_uses_identical_arguments() {
    let client = MockQueryClient::new();
    client.push_error(reset()).push_response(r#"{"id":null}"#);
    let args = QueryArgs::new().arg(USER_ID).named("limit", 1);

    QueryExecutor::new(&client, QueryMethod::Single)
        .unwrap()
        .execute("SELECT id FROM users WHERE id = $1", &args)
        .unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[1].args, args);
}

#[test]
fn test_second_connection_failure_propagates() {
    let client = MockQueryClient::new();
    client.push_error(reset()).push_error(reset()).push_response("[]");

    let mut executor = QueryExecutor::multiple(&client).unwrap();
    let err = executor
        .execute("SELECT 1", &QueryArgs::new())
        .err()
        .unwrap();

    assert!(matches!(
        err,
        QueryError::Client(ClientError::ConnectionFailed(_))
    ));
    assert_eq!(client.call_count(), 2);
    assert!(executor.raw_result().is_none());
}

#[test]
fn test_other_errors_are_not_retried() {
    let client = MockQueryClient::new();
    client
        .push_error(ClientError::query("syntax error at or near \"SELEC\""))
        .push_response("[]");

    let mut executor = QueryExecutor::multiple(&client).unwrap();
    let err = executor.execute("SELEC 1", &QueryArgs::new()).err().unwrap();

    assert_eq!(
        err.to_string(),
        "Query error: syntax error at or near \"SELEC\""
    );
    assert_eq!(client.call_count(), 1);
}

#[test]
fn test_required_single_with_no_rows() {
    let client = MockQueryClient::new();
    let mut executor = QueryExecutor::new(&client, QueryMethod::SingleRequired).unwrap();

    let err = executor
        .execute("SELECT id FROM users WHERE false", &QueryArgs::new())
        .err()
        .unwrap();

    assert!(matches!(err, QueryError::Client(ClientError::NoData)));
    assert_eq!(client.call_count(), 1);
}

#[test]
fn test_closed_client_is_rejected() {
    let client = MockQueryClient::closed();

    let err = QueryExecutor::new(&client, QueryMethod::Multiple).err().unwrap();

    assert!(matches!(err, QueryError::InvalidArgument(_)));
    assert_eq!(client.call_count(), 0);
}

#[test]
fn test_unknown_method_is_rejected() {
    let client = MockQueryClient::new();

    assert!(matches!(
        QueryExecutor::with_method_name(&client, "several").err(),
        Some(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        QueryMethod::try_from(9),
        Err(QueryError::InvalidArgument(_))
    ));
}

#[test]
fn test_parse_before_execute() {
    let client = MockQueryClient::new();
    let executor = QueryExecutor::multiple(&client).unwrap();

    assert!(matches!(
        executor.parse::<Vec<User>>(),
        Err(QueryError::EmptyResult)
    ));
}

#[test]
fn test_null_payload_parses_to_none() {
    let client = MockQueryClient::new();
    let mut executor = QueryExecutor::new(&client, QueryMethod::Single).unwrap();

    let user = executor
        .execute("SELECT id FROM users WHERE false", &QueryArgs::new())
        .unwrap()
        .parse::<User>()
        .unwrap();

    assert_eq!(user, None);
}

#[test]
fn test_parse_object_with_uuid() {
    let client = MockQueryClient::new();
    client.push_response(format!(r#"{{"id":"{USER_ID}"}}"#));
    let mut executor = QueryExecutor::new(&client, QueryMethod::SingleRequired).unwrap();

    let user: User = executor
        .execute("SELECT id FROM users LIMIT 1", &QueryArgs::new())
        .unwrap()
        .parse()
        .unwrap()
        .unwrap();

    assert_eq!(user.id, Uuid::parse_str(USER_ID).unwrap());
}

#[test]
fn test_malformed_payload_is_decode_error() {
    let client = MockQueryClient::new();
    client
        .push_response(r#"{"id": "#)
        .push_response(r#"{"id":"not-a-uuid"}"#);
    let mut executor = QueryExecutor::new(&client, QueryMethod::Single).unwrap();

    executor.execute("q", &QueryArgs::new()).unwrap();
    assert!(matches!(
        executor.parse::<User>(),
        Err(QueryError::Decode(_))
    ));

    executor.execute("q", &QueryArgs::new()).unwrap();
    assert!(matches!(
        executor.parse::<User>(),
        Err(QueryError::Decode(_))
    ));
}
