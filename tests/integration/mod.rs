//! Integration tests for typed-query.

pub mod executor_test;
