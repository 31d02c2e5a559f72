//! Whole-table reports.

use tracing::{debug, error, info};

use crate::config::{effective_custom_query, FetchErrorPolicy, ReportConfig};
use crate::db::DatabaseClient;
use crate::error::{DigestError, Result};
use crate::format::{render_report, NO_DATA_MESSAGE};
use crate::output::{OutputMetadata, OutputRecord};
use crate::query::{build_table_check, build_table_scan, BatchFetcher, QueryKind};
use crate::safety::ensure_read_only;

/// Runs one report against an open client.
pub struct TableReporter<'a> {
    db: &'a dyn DatabaseClient,
    config: &'a ReportConfig,
}

impl<'a> TableReporter<'a> {
    pub fn new(db: &'a dyn DatabaseClient, config: &'a ReportConfig) -> Self {
        Self { db, config }
    }

    /// Runs the report, turning any failure into an error record.
    pub async fn run(&self) -> OutputRecord {
        match self.try_run().await {
            Ok(record) => record,
            Err(e) => {
                error!("Report failed: {}", e);
                OutputRecord::error(&e)
            }
        }
    }

    pub async fn try_run(&self) -> Result<OutputRecord> {
        let config = self.config;
        let table = config.table_name.trim();
        let query = build_table_scan(
            table,
            config.limit,
            effective_custom_query(config.custom_query.as_deref()),
        )?;

        match query.kind {
            QueryKind::Custom => ensure_read_only(&query.sql, config.allow_writes)?,
            QueryKind::Default => self.verify_table(table).await?,
        }

        let fetcher = BatchFetcher::new(self.db, config.on_fetch_error);
        let mut result = fetcher.fetch_all(&query.sql).await?;
        debug!("Report query took {:?}", result.execution_time);

        // Custom SQL carries no generated LIMIT.
        if query.kind == QueryKind::Custom && config.limit > 0 {
            let limit = usize::try_from(config.limit).unwrap_or(usize::MAX);
            result.rows.truncate(limit);
            result.row_count = result.rows.len();
        }

        if result.is_empty() {
            let text = if table.is_empty() {
                NO_DATA_MESSAGE.to_string()
            } else {
                format!("No data was found in table {table}.")
            };
            return Ok(OutputRecord::text_only(text));
        }

        let text = render_report(&result, config.format);
        info!("Formatted {} rows as {}", result.rows.len(), config.format);

        let columns = result.column_names().into_iter().map(String::from).collect();
        let metadata =
            OutputMetadata::new(query.kind, table, &query.sql, result.rows.len() as u64)
                .with_report(config.format, columns);
        Ok(OutputRecord::new(text, metadata))
    }

    /// Checks the table is readable before scanning it.
    ///
    /// Under `Degrade` a failed check is logged and the run continues, so the
    /// scan degrades to the empty-table message.
    async fn verify_table(&self, table: &str) -> Result<()> {
        let sql = build_table_check(table)?;
        match self.db.execute_query(&sql).await {
            Ok(_) => {
                info!("Table {} verified", table);
                Ok(())
            }
            Err(e) => {
                let err = DigestError::query(format!(
                    "table {table} does not exist or is not accessible. {e}"
                ));
                match self.config.on_fetch_error {
                    FetchErrorPolicy::Strict => Err(err),
                    FetchErrorPolicy::Degrade => {
                        error!("{}", err);
                        Ok(())
                    }
                }
            }
        }
    }
}
