//! Integration tests for sql-digest.
//!
//! Pipeline tests run against the in-memory mock client. The MySQL tests
//! require a running server and are skipped unless DATABASE_URL is set.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
