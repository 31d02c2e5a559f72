//! End-to-end report scenarios against the mock client.

use pretty_assertions::assert_eq;
use sql_digest::config::ReportConfig;
use sql_digest::db::{MockDatabaseClient, Value};
use sql_digest::format::ReportStyle;
use sql_digest::pipeline;

fn products() -> MockDatabaseClient {
    MockDatabaseClient::new()
        .with_table(
            "products",
            &["sku", "name", "price"],
            vec![
                vec![Value::from("A-1"), Value::from("Lamp"), Value::Float(19.5)],
                vec![Value::from("B-2"), Value::from("Desk"), Value::Null],
            ],
        )
        .with_table("archive", &["sku"], Vec::new())
}

fn report(table: &str, format: ReportStyle) -> ReportConfig {
    ReportConfig {
        table_name: table.to_string(),
        format,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_structured_report() {
    let db = products();
    let record = pipeline::report_with(&db, &report("products", ReportStyle::Structured)).await;

    assert_eq!(
        record.text(),
        "STRUCTURED DATA:\n\n\
         Record #1:\n  sku: A-1\n  name: Lamp\n  price: 19.5\n\n\
         Record #2:\n  sku: B-2\n  name: Desk\n  price: NULL\n\n"
    );
    assert_eq!(db.close_count(), 1);
}

#[tokio::test]
async fn test_natural_report() {
    let db = products();
    let record = pipeline::report_with(&db, &report("products", ReportStyle::Natural)).await;

    assert_eq!(
        record.text(),
        "NATURAL LANGUAGE SUMMARY:\n\n\
         Found 2 records with 3 columns.\n\n\
         In record 1, the sku is 'A-1', the name is 'Lamp', the price is '19.5'.\n\
         In record 2, the sku is 'B-2', the name is 'Desk', the price is 'NULL'.\n"
    );
}

#[tokio::test]
async fn test_technical_report() {
    let db = products();
    let record = pipeline::report_with(&db, &report("products", ReportStyle::Technical)).await;

    let text = record.text();
    assert!(text.starts_with("TECHNICAL ANALYSIS:\n\nShape: (2, 3)\nColumns: sku, name, price\n"));
    assert!(text.contains("\nprice:\n  - Type: float\n  - Unique values: 1\n  - Nulls: 1\n"));

    let metadata = record.metadata().unwrap();
    assert_eq!(metadata.format, Some(ReportStyle::Technical));
    assert_eq!(metadata.query, "SELECT * FROM products WHERE 1=1 LIMIT 10");
}

#[tokio::test]
async fn test_empty_table_for_every_style() {
    let db = products();
    for style in [
        ReportStyle::Structured,
        ReportStyle::Natural,
        ReportStyle::Technical,
    ] {
        let record = pipeline::report_with(&db, &report("archive", style)).await;
        assert_eq!(record.text(), "No data was found in table archive.");
        assert!(record.metadata().is_none());
    }
}

#[tokio::test]
async fn test_unlimited_report_has_no_limit_clause() {
    let db = products();
    let config = ReportConfig {
        limit: 0,
        ..report("products", ReportStyle::Structured)
    };

    pipeline::report_with(&db, &config).await;
    assert_eq!(
        db.executed_queries().last().map(String::as_str),
        Some("SELECT * FROM products WHERE 1=1")
    );
}
