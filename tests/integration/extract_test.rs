//! End-to-end extraction scenarios against the mock client.

use pretty_assertions::assert_eq;
use sql_digest::config::{ExtractConfig, FetchErrorPolicy};
use sql_digest::db::{MockDatabaseClient, Value};
use sql_digest::output::OutputRecord;
use sql_digest::pipeline;
use sql_digest::query::QueryKind;

fn items() -> MockDatabaseClient {
    MockDatabaseClient::new().with_table(
        "items",
        &["content", "author"],
        vec![
            vec![Value::from("hello"), Value::from("a")],
            vec![Value::from(""), Value::from("b")],
        ],
    )
}

fn items_config() -> ExtractConfig {
    ExtractConfig {
        table_name: "items".to_string(),
        content_columns: "content".to_string(),
        context_columns: "author".to_string(),
        ..Default::default()
    }
}

/// Scenario: blank content is skipped
/// Given a table `items` with one blank and one non-blank content value
/// When the extraction runs
/// Then exactly one block is produced, for the first row
#[tokio::test]
async fn test_items_produces_one_block() {
    let db = items();
    let record = pipeline::extract_with(&db, &items_config()).await;

    assert_eq!(
        record.text(),
        "CONTEXT: {\"author\": \"a\"}\nCONTENT: hello\n===\n"
    );

    let metadata = record.metadata().unwrap();
    assert_eq!(metadata.query_type, QueryKind::Default);
    assert_eq!(metadata.table_name, "items");
    assert_eq!(metadata.num_records, 2);
    assert_eq!(metadata.content_columns, vec!["content"]);
    assert_eq!(metadata.context_columns, vec!["author"]);
    assert_eq!(metadata.source, "sql_database");
    assert_eq!(metadata.query, "SELECT content, author FROM items WHERE 1=1");
    assert_eq!(db.close_count(), 1);
}

#[tokio::test]
async fn test_custom_query_is_run_verbatim() {
    let db = items();
    let custom = "SELECT `author`, `content` FROM `items` LIMIT 1";
    let config = ExtractConfig {
        custom_query: Some(custom.to_string()),
        limit: 99,
        ..items_config()
    };

    let record = pipeline::extract_with(&db, &config).await;

    assert_eq!(db.executed_queries(), vec![custom]);
    let metadata = record.metadata().unwrap();
    assert_eq!(metadata.query_type, QueryKind::Custom);
    assert_eq!(metadata.query, custom);
}

#[tokio::test]
async fn test_whitespace_custom_query_falls_back_to_table() {
    let db = items();
    let config = ExtractConfig {
        custom_query: Some("  \n ".to_string()),
        ..items_config()
    };

    let record = pipeline::extract_with(&db, &config).await;
    assert_eq!(record.metadata().unwrap().query_type, QueryKind::Default);
}

#[tokio::test]
async fn test_context_column_order_is_kept() {
    let db = MockDatabaseClient::new().with_table(
        "wp_comments",
        &["comment_date", "comment_author", "comment_post_ID", "comment_content"],
        vec![vec![
            Value::from("2024-01-05 10:00:00"),
            Value::from("Zoë"),
            Value::Int(42),
            Value::from("Great post"),
        ]],
    );
    let config = ExtractConfig {
        table_name: "wp_comments".to_string(),
        content_columns: "comment_content".to_string(),
        context_columns: "comment_post_ID,comment_author,comment_date".to_string(),
        ..Default::default()
    };

    let record = pipeline::extract_with(&db, &config).await;
    assert_eq!(
        record.text(),
        "CONTEXT: {\"comment_post_ID\": \"42\", \"comment_author\": \"Zoë\", \
         \"comment_date\": \"2024-01-05 10:00:00\"}\nCONTENT: Great post\n===\n"
    );
}

#[tokio::test]
async fn test_limit_stops_after_threshold_chunk() {
    let db = MockDatabaseClient::new().with_table(
        "numbers",
        &["n"],
        (1..=100).map(|n| vec![Value::Int(n)]).collect(),
    );
    let config = ExtractConfig {
        custom_query: Some("SELECT n FROM numbers".to_string()),
        content_columns: "n".to_string(),
        context_columns: "n".to_string(),
        batch_size: 30,
        limit: 45,
        ..Default::default()
    };

    let record = pipeline::extract_with(&db, &config).await;

    // Two chunks reach the limit; the rest are never pulled.
    assert_eq!(db.chunks_pulled(), 2);
    assert_eq!(record.metadata().unwrap().num_records, 60);
}

#[tokio::test]
async fn test_unknown_table_under_each_policy() {
    let db = items();
    let strict = ExtractConfig {
        table_name: "nope".to_string(),
        ..items_config()
    };
    let record = pipeline::extract_with(&db, &strict).await;
    assert!(record.text().contains("Table 'nope' doesn't exist"));
    assert!(record.metadata().is_none());

    let degrade = ExtractConfig {
        on_fetch_error: FetchErrorPolicy::Degrade,
        ..strict
    };
    let record = pipeline::extract_with(&db, &degrade).await;
    assert_eq!(record, OutputRecord::no_data());
}

#[tokio::test]
async fn test_json_output_round_trips() {
    let db = items();
    let record = pipeline::extract_with(&db, &items_config()).await;

    let json = record.to_json().unwrap();
    let back: OutputRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}
