//! Query execution with an explicit failure policy.
//!
//! Wraps a `DatabaseClient` so that callers choose whether a failed fetch is
//! logged and treated as an empty result, or surfaced as an error.

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, error};

use crate::config::FetchErrorPolicy;
use crate::db::{ChunkStream, DatabaseClient, QueryResult};
use crate::error::Result;

/// Executes queries whole or in chunks, applying a `FetchErrorPolicy`.
#[derive(Clone, Copy)]
pub struct BatchFetcher<'a> {
    db: &'a dyn DatabaseClient,
    policy: FetchErrorPolicy,
}

impl<'a> BatchFetcher<'a> {
    /// Creates a new fetcher over the given client.
    pub fn new(db: &'a dyn DatabaseClient, policy: FetchErrorPolicy) -> Self {
        Self { db, policy }
    }

    /// Fetches the entire result set.
    ///
    /// Under `Degrade`, a failure is logged and an empty result returned.
    pub async fn fetch_all(&self, sql: &str) -> Result<QueryResult> {
        debug!("Executing query: {}", sql);
        match self.db.execute_query(sql).await {
            Ok(result) => Ok(result),
            Err(e) => match self.policy {
                FetchErrorPolicy::Strict => Err(e),
                FetchErrorPolicy::Degrade => {
                    error!("Query failed, continuing with an empty result: {}", e);
                    Ok(QueryResult::new())
                }
            },
        }
    }

    /// Streams the result in chunks of at most `batch_size` rows.
    ///
    /// Under `Degrade`, the first failure is logged and ends the stream.
    pub fn fetch_chunks(&self, sql: &'a str, batch_size: usize) -> ChunkStream<'a> {
        debug!("Executing query in batches of {}: {}", batch_size, sql);
        let chunks = self.db.fetch_chunks(sql, batch_size);
        match self.policy {
            FetchErrorPolicy::Strict => chunks,
            FetchErrorPolicy::Degrade => chunks
                .scan((), |_, chunk| {
                    future::ready(match chunk {
                        Ok(chunk) => Some(Ok(chunk)),
                        Err(e) => {
                            error!("Batch fetch failed, stopping early: {}", e);
                            None
                        }
                    })
                })
                .boxed(),
        }
    }

    /// Chunked stream when `batch_size > 0`, otherwise a single chunk holding
    /// the whole result.
    pub fn fetch(&self, sql: &'a str, batch_size: usize) -> ChunkStream<'a> {
        if batch_size > 0 {
            return self.fetch_chunks(sql, batch_size);
        }
        let this = *self;
        stream::once(async move { this.fetch_all(sql).await }).boxed()
    }
}
