//! Integration tests for sql-digest.

pub mod connection_test;
pub mod extract_test;
pub mod mysql_test;
pub mod report_test;
