//! SQL text generation for the extraction and report pipelines.

use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content and context column lists for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    content: Vec<String>,
    context: Vec<String>,
}

impl ColumnSpec {
    /// Builds a column spec, trimming names and rejecting blank entries.
    pub fn new<I, J, S, T>(content: I, context: J) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            content: normalize(content, "content")?,
            context: normalize(context, "context")?,
        })
    }

    /// Parses two comma-separated lists, e.g. `"body"` and `"post_id, author"`.
    pub fn parse(content: &str, context: &str) -> Result<Self> {
        Self::new(content.split(','), context.split(','))
    }

    /// Columns holding the payload, in configured order.
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// Columns carried next to every payload value, in configured order.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Content then context columns, first occurrence wins.
    pub fn selected_columns(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.content.len() + self.context.len());
        for name in self.content.iter().chain(&self.context) {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }
}

fn normalize<I, S>(names: I, label: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .collect();

    if names.is_empty() || names.iter().all(String::is_empty) {
        return Err(DigestError::validation(format!(
            "at least one {label} column is required"
        )));
    }
    if names.iter().any(String::is_empty) {
        return Err(DigestError::validation(format!(
            "{label} column list contains a blank name"
        )));
    }
    Ok(names)
}

/// Where the executed SQL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Supplied verbatim by the caller.
    Custom,
    /// Generated from the table name and columns.
    Default,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom => write!(f, "custom"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A SQL statement ready to run, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub kind: QueryKind,
}

impl BuiltQuery {
    fn custom(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            kind: QueryKind::Custom,
        }
    }

    fn generated(sql: String) -> Self {
        Self {
            sql,
            kind: QueryKind::Default,
        }
    }
}

/// Builds the extraction query.
///
/// A non-blank `custom_query` is returned verbatim. Otherwise the query selects
/// the deduplicated content and context columns from `table`, with a `LIMIT`
/// clause only when `limit` is positive.
pub fn build_select(
    table: &str,
    columns: &ColumnSpec,
    limit: u64,
    custom_query: Option<&str>,
) -> Result<BuiltQuery> {
    if let Some(custom) = custom_query.filter(|q| !q.trim().is_empty()) {
        return Ok(BuiltQuery::custom(custom));
    }

    let table = validate_table(table)?;
    let select_list = columns.selected_columns().join(", ");
    Ok(BuiltQuery::generated(format!(
        "SELECT {select_list} FROM {table} WHERE 1=1{}",
        limit_clause(limit)
    )))
}

/// Builds the report query: every column of `table`, optionally limited.
pub fn build_table_scan(
    table: &str,
    limit: u64,
    custom_query: Option<&str>,
) -> Result<BuiltQuery> {
    if let Some(custom) = custom_query.filter(|q| !q.trim().is_empty()) {
        return Ok(BuiltQuery::custom(custom));
    }

    let table = validate_table(table)?;
    Ok(BuiltQuery::generated(format!(
        "SELECT * FROM {table} WHERE 1=1{}",
        limit_clause(limit)
    )))
}

/// Builds a one-row query that succeeds only if `table` is readable.
pub fn build_table_check(table: &str) -> Result<String> {
    let table = validate_table(table)?;
    Ok(format!("SELECT 1 FROM {table} LIMIT 1"))
}

fn validate_table(table: &str) -> Result<&str> {
    let table = table.trim();
    if table.is_empty() {
        return Err(DigestError::validation("table name must not be empty"));
    }
    Ok(table)
}

fn limit_clause(limit: u64) -> String {
    if limit > 0 {
        format!(" LIMIT {limit}")
    } else {
        String::new()
    }
}
