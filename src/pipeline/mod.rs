//! The two end-to-end pipelines.
//!
//! Each invocation opens one client, runs sequentially, and closes the client
//! before returning. Failures never escape: they come back as error records.

mod extract;
mod report;

pub use extract::ContextExtractor;
pub use report::TableReporter;

use tracing::{error, info, warn};

use crate::config::{ConnectionConfig, ExtractConfig, ReportConfig};
use crate::db::{self, DatabaseClient};
use crate::output::OutputRecord;

/// Connects, extracts, and closes.
pub async fn extract(connection: &ConnectionConfig, config: &ExtractConfig) -> OutputRecord {
    match open(connection).await {
        Ok(client) => extract_with(client.as_ref(), config).await,
        Err(record) => record,
    }
}

/// Connects, reports, and closes.
pub async fn report(connection: &ConnectionConfig, config: &ReportConfig) -> OutputRecord {
    match open(connection).await {
        Ok(client) => report_with(client.as_ref(), config).await,
        Err(record) => record,
    }
}

/// Extracts through an already open client, then closes it.
pub async fn extract_with(db: &dyn DatabaseClient, config: &ExtractConfig) -> OutputRecord {
    let record = ContextExtractor::new(db, config).run().await;
    close(db).await;
    record
}

/// Reports through an already open client, then closes it.
pub async fn report_with(db: &dyn DatabaseClient, config: &ReportConfig) -> OutputRecord {
    let record = TableReporter::new(db, config).run().await;
    close(db).await;
    record
}

async fn open(
    connection: &ConnectionConfig,
) -> std::result::Result<Box<dyn DatabaseClient>, OutputRecord> {
    info!("Connecting to database: {}", connection.display_string());
    db::connect(connection).await.map_err(|e| {
        error!("Connection failed: {}", e);
        OutputRecord::error(&e)
    })
}

async fn close(db: &dyn DatabaseClient) {
    if let Err(e) = db.close().await {
        warn!("Failed to close database connection: {}", e);
    }
}
