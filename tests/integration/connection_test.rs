//! Connection failure handling.
//!
//! Failures never escape a pipeline: they come back as error records
//! without metadata.

use sql_digest::config::{ConnectionConfig, ExtractConfig, ReportConfig};
use sql_digest::db::FailingDatabaseClient;
use sql_digest::pipeline;

fn extract_config() -> ExtractConfig {
    ExtractConfig {
        table_name: "items".to_string(),
        content_columns: "content".to_string(),
        context_columns: "author".to_string(),
        ..Default::default()
    }
}

/// Scenario: the server goes away during the fetch
/// Given a client whose every call fails with a connection error
/// When the extraction runs with default settings
/// Then the record text is an error message and there is no metadata
#[tokio::test]
async fn test_connection_failure_on_fetch_is_error_record() {
    let db = FailingDatabaseClient::new();
    let record = pipeline::extract_with(&db, &extract_config()).await;

    assert!(record
        .text()
        .starts_with("Error processing data: Connection error:"));
    assert!(record.text().contains("db.invalid"));
    assert!(record.metadata().is_none());
}

#[tokio::test]
async fn test_connection_failure_on_report_is_error_record() {
    let db = FailingDatabaseClient::new();
    let config = ReportConfig {
        table_name: "items".to_string(),
        ..Default::default()
    };

    let record = pipeline::report_with(&db, &config).await;
    assert!(record.text().starts_with("Error processing data:"));
    assert!(record.metadata().is_none());
}

#[tokio::test]
async fn test_refused_connection_is_error_record() {
    let connection = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        port: 1,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        ..Default::default()
    };

    let record = pipeline::extract(&connection, &extract_config()).await;
    assert!(record
        .text()
        .starts_with("Error processing data: Connection error:"));
    assert!(record.metadata().is_none());
}

#[tokio::test]
async fn test_missing_database_name_is_error_record() {
    let connection = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        ..Default::default()
    };

    let record = pipeline::report(&connection, &ReportConfig::default()).await;
    assert_eq!(
        record.text(),
        "Error processing data: Configuration error: Database name is required"
    );
    assert!(record.metadata().is_none());
}
