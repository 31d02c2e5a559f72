//! Database abstraction layer for sql-digest.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends (and test doubles) to be used interchangeably.

mod mock;
mod mysql;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A lazy, forward-only sequence of result chunks.
///
/// Each item holds at most the requested batch size of rows. The stream is
/// consumed once; pulling stops the moment the caller drops it.
pub type ChunkStream<'a> = BoxStream<'a, Result<QueryResult>>;

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = MySqlClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// All database operations return Results with DigestError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the whole result set.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Executes a SQL query and streams the result in chunks of at most
    /// `batch_size` rows. A `batch_size` of 0 is treated as 1.
    fn fetch_chunks<'a>(&'a self, sql: &'a str, batch_size: usize) -> ChunkStream<'a>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
