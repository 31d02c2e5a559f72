//! sql-digest - turn MySQL tables into text for downstream pipelines.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod safety;
