//! Context-preserving extraction.

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::config::{effective_custom_query, ExtractConfig};
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::format::ContextFormatter;
use crate::output::{OutputMetadata, OutputRecord};
use crate::query::{build_select, BatchFetcher, ColumnSpec, QueryKind};
use crate::safety::ensure_read_only;

/// Runs one extraction against an open client.
pub struct ContextExtractor<'a> {
    db: &'a dyn DatabaseClient,
    config: &'a ExtractConfig,
}

impl<'a> ContextExtractor<'a> {
    pub fn new(db: &'a dyn DatabaseClient, config: &'a ExtractConfig) -> Self {
        Self { db, config }
    }

    /// Runs the extraction, turning any failure into an error record.
    pub async fn run(&self) -> OutputRecord {
        match self.try_run().await {
            Ok(record) => record,
            Err(e) => {
                error!("Extraction failed: {}", e);
                OutputRecord::error(&e)
            }
        }
    }

    /// Builds the query, pulls chunks until exhausted or the limit is met, and
    /// formats each chunk as it arrives.
    pub async fn try_run(&self) -> Result<OutputRecord> {
        let config = self.config;
        let columns = ColumnSpec::parse(&config.content_columns, &config.context_columns)?;
        let query = build_select(
            &config.table_name,
            &columns,
            config.limit,
            effective_custom_query(config.custom_query.as_deref()),
        )?;
        if query.kind == QueryKind::Custom {
            ensure_read_only(&query.sql, config.allow_writes)?;
        }

        let fetcher = BatchFetcher::new(self.db, config.on_fetch_error);
        let formatter = ContextFormatter::new(&columns);

        let mut text = String::new();
        let mut total_records: u64 = 0;
        let mut chunks = fetcher.fetch(&query.sql, config.batch_size);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }

            text.push_str(&formatter.format_chunk(&chunk)?);
            total_records += chunk.rows.len() as u64;
            info!(
                "Processed {} records... (chunk took {:?})",
                total_records, chunk.execution_time
            );

            if config.limit > 0 && total_records >= config.limit {
                debug!("Limit of {} reached, stopping", config.limit);
                break;
            }
        }

        if text.is_empty() {
            return Ok(OutputRecord::no_data());
        }

        let metadata =
            OutputMetadata::new(query.kind, &config.table_name, &query.sql, total_records)
                .with_column_spec(columns.content(), columns.context());
        Ok(OutputRecord::new(text, metadata))
    }
}
