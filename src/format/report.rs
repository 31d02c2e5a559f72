//! Whole-table report rendering.

use std::collections::HashSet;

use super::{ReportStyle, NO_DATA_MESSAGE};
use crate::db::{QueryResult, Value};

/// Values longer than this many characters are cut in natural-language reports.
const NATURAL_MAX_VALUE_CHARS: usize = 100;

/// Renders a full result under the given style.
///
/// A result without rows always renders as [`NO_DATA_MESSAGE`].
pub fn render_report(result: &QueryResult, style: ReportStyle) -> String {
    if result.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }

    match style {
        ReportStyle::Structured => structured(result),
        ReportStyle::Natural => natural(result),
        ReportStyle::Technical => technical(result),
    }
}

fn structured(result: &QueryResult) -> String {
    let mut text = String::from("STRUCTURED DATA:\n\n");
    for (n, row) in result.rows.iter().enumerate() {
        text.push_str(&format!("Record #{}:\n", n + 1));
        for (column, value) in result.columns.iter().zip(row) {
            text.push_str(&format!("  {}: {}\n", column.name, value));
        }
        text.push('\n');
    }
    text
}

fn natural(result: &QueryResult) -> String {
    let mut text = String::from("NATURAL LANGUAGE SUMMARY:\n\n");
    text.push_str(&format!(
        "Found {} records with {} columns.\n\n",
        result.rows.len(),
        result.columns.len()
    ));

    for (n, row) in result.rows.iter().enumerate() {
        let descriptions: Vec<String> = result
            .columns
            .iter()
            .zip(row)
            .map(|(column, value)| format!("the {} is '{}'", column.name, truncate(value)))
            .collect();
        text.push_str(&format!("In record {}, {}.\n", n + 1, descriptions.join(", ")));
    }
    text
}

fn truncate(value: &Value) -> String {
    let text = value.to_display_string();
    if text.chars().count() <= NATURAL_MAX_VALUE_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(NATURAL_MAX_VALUE_CHARS).collect();
    cut.push_str("...");
    cut
}

fn technical(result: &QueryResult) -> String {
    let mut text = String::from("TECHNICAL ANALYSIS:\n\n");
    text.push_str(&format!(
        "Shape: ({}, {})\n",
        result.rows.len(),
        result.columns.len()
    ));
    text.push_str(&format!("Columns: {}\n\n", result.column_names().join(", ")));
    text.push_str("Statistics:\n");

    for (index, column) in result.columns.iter().enumerate() {
        let stats = ColumnStats::collect(result.column_values(index));
        text.push_str(&format!("\n{}:\n", column.name));
        text.push_str(&format!("  - Type: {}\n", stats.kind));
        text.push_str(&format!("  - Unique values: {}\n", stats.distinct));
        text.push_str(&format!("  - Nulls: {}\n", stats.nulls));
    }
    text
}

/// Per-column summary for the technical report.
struct ColumnStats {
    kind: &'static str,
    distinct: usize,
    nulls: usize,
}

impl ColumnStats {
    fn collect<'v>(values: impl Iterator<Item = &'v Value>) -> Self {
        let mut kinds: Vec<&'static str> = Vec::new();
        let mut distinct: HashSet<(&'static str, String)> = HashSet::new();
        let mut nulls = 0;

        for value in values {
            if value.is_null() {
                nulls += 1;
                continue;
            }
            let kind = value.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
            distinct.insert((kind, value.to_display_string()));
        }

        Self {
            kind: infer_kind(&kinds),
            distinct: distinct.len(),
            nulls,
        }
    }
}

/// Single kind when uniform; integers mixed with floats widen to float.
fn infer_kind(kinds: &[&'static str]) -> &'static str {
    match kinds {
        [] => "null",
        [kind] => kind,
        _ if kinds.iter().all(|k| matches!(*k, "integer" | "float")) => "float",
        _ => "mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;
    use pretty_assertions::assert_eq;

    fn people() -> QueryResult {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("id", "INT"),
                ColumnInfo::new("name", "VARCHAR"),
                ColumnInfo::new("score", "DOUBLE"),
            ],
            vec![
                vec![Value::Int(1), Value::from("Ana"), Value::Float(9.5)],
                vec![Value::Int(2), Value::from("Luis"), Value::Null],
                vec![Value::Int(3), Value::from("Ana"), Value::Int(7)],
            ],
        )
    }

    #[test]
    fn test_empty_table_gives_no_data_for_every_style() {
        let empty = QueryResult::with_data(vec![ColumnInfo::new("id", "INT")], Vec::new());
        for style in [
            ReportStyle::Structured,
            ReportStyle::Natural,
            ReportStyle::Technical,
        ] {
            assert_eq!(render_report(&empty, style), NO_DATA_MESSAGE);
            assert_eq!(render_report(&QueryResult::new(), style), NO_DATA_MESSAGE);
        }
    }

    #[test]
    fn test_structured() {
        let text = render_report(&people(), ReportStyle::Structured);
        assert!(text.starts_with(
            "STRUCTURED DATA:\n\nRecord #1:\n  id: 1\n  name: Ana\n  score: 9.5\n\nRecord #2:\n"
        ));
        assert!(text.contains("Record #3:\n  id: 3\n  name: Ana\n  score: 7\n\n"));
        assert!(!text.contains("Record #4"));
    }

    #[test]
    fn test_natural() {
        let text = render_report(&people(), ReportStyle::Natural);
        assert_eq!(
            text,
            "NATURAL LANGUAGE SUMMARY:\n\n\
             Found 3 records with 3 columns.\n\n\
             In record 1, the id is '1', the name is 'Ana', the score is '9.5'.\n\
             In record 2, the id is '2', the name is 'Luis', the score is 'NULL'.\n\
             In record 3, the id is '3', the name is 'Ana', the score is '7'.\n"
        );
    }

    #[test]
    fn test_natural_truncates_long_values() {
        let long = "x".repeat(150);
        let exact = "y".repeat(100);
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("a", "TEXT"), ColumnInfo::new("b", "TEXT")],
            vec![vec![Value::from(long.as_str()), Value::from(exact.as_str())]],
        );

        let text = render_report(&result, ReportStyle::Natural);
        assert!(text.contains(&format!("the a is '{}...'", "x".repeat(100))));
        assert!(text.contains(&format!("the b is '{exact}'")));
    }

    #[test]
    fn test_natural_truncation_counts_characters() {
        let accented = "é".repeat(101);
        let text = truncate(&Value::from(accented.as_str()));
        assert_eq!(text.chars().count(), 103);
        assert!(text.ends_with("é..."));
    }

    #[test]
    fn test_technical() {
        let text = render_report(&people(), ReportStyle::Technical);
        assert_eq!(
            text,
            "TECHNICAL ANALYSIS:\n\n\
             Shape: (3, 3)\n\
             Columns: id, name, score\n\n\
             Statistics:\n\
             \nid:\n  - Type: integer\n  - Unique values: 3\n  - Nulls: 0\n\
             \nname:\n  - Type: text\n  - Unique values: 2\n  - Nulls: 0\n\
             \nscore:\n  - Type: float\n  - Unique values: 2\n  - Nulls: 1\n"
        );
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind(&[]), "null");
        assert_eq!(infer_kind(&["date"]), "date");
        assert_eq!(infer_kind(&["integer", "float"]), "float");
        assert_eq!(infer_kind(&["integer", "text"]), "mixed");
    }
}
