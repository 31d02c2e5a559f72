//! Pipelines against a real MySQL server.
//!
//! Skipped unless DATABASE_URL is set.

use futures::StreamExt;
use sql_digest::config::{ConnectionConfig, ExtractConfig, ReportConfig};
use sql_digest::db::{DatabaseClient, MySqlClient, Value};
use sql_digest::format::ReportStyle;
use sql_digest::pipeline;

/// Helper to get test connection settings from the environment.
fn get_test_connection() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

const ITEMS: &str = "SELECT 'hello' AS content, 'a' AS author \
                     UNION ALL SELECT '', 'b' \
                     UNION ALL SELECT 'adiós', 'ç'";

#[tokio::test]
async fn test_extract_custom_query() {
    let Some(connection) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let config = ExtractConfig {
        custom_query: Some(ITEMS.to_string()),
        content_columns: "content".to_string(),
        context_columns: "author".to_string(),
        batch_size: 2,
        ..Default::default()
    };

    let record = pipeline::extract(&connection, &config).await;
    assert_eq!(
        record.text(),
        "CONTEXT: {\"author\": \"a\"}\nCONTENT: hello\n===\n\
         CONTEXT: {\"author\": \"ç\"}\nCONTENT: adiós\n===\n"
    );
    assert_eq!(record.metadata().map(|m| m.num_records), Some(3));
}

#[tokio::test]
async fn test_report_custom_query() {
    let Some(connection) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let config = ReportConfig {
        custom_query: Some(ITEMS.to_string()),
        format: ReportStyle::Technical,
        ..Default::default()
    };

    let record = pipeline::report(&connection, &config).await;
    assert!(record.text().starts_with("TECHNICAL ANALYSIS:\n\nShape: (3, 2)\n"));
}

#[tokio::test]
async fn test_report_unknown_table() {
    let Some(connection) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let config = ReportConfig {
        table_name: "nonexistent_table_xyz".to_string(),
        ..Default::default()
    };

    let record = pipeline::report(&connection, &config).await;
    assert!(record.text().contains("nonexistent_table_xyz does not exist"));
    assert!(record.metadata().is_none());
}

#[tokio::test]
async fn test_value_decoding() {
    let Some(connection) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let Ok(client) = MySqlClient::connect(&connection).await else {
        eprintln!("Skipping test: could not connect");
        return;
    };

    let mut chunks = client.fetch_chunks(
        "SELECT CAST(7 AS SIGNED) AS i, CAST(7 AS UNSIGNED) AS u, NULL AS n, \
         DATE('2024-02-29') AS d, 'x' AS s",
        10,
    );
    let chunk = chunks.next().await.unwrap().unwrap();
    drop(chunks);

    let row = &chunk.rows[0];
    assert_eq!(row[0], Value::Int(7));
    assert_eq!(row[1], Value::UInt(7));
    assert!(row[2].is_null());
    assert_eq!(row[3].to_display_string(), "2024-02-29");
    assert_eq!(row[4], Value::from("x"));

    client.close().await.unwrap();
}
