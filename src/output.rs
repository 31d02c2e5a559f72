//! Output records returned by both pipelines.
//!
//! A record is a text blob plus optional metadata describing how it was
//! produced. Records are built once and never modified.

use serde::{Deserialize, Serialize};

use crate::error::{DigestError, Result};
use crate::format::ReportStyle;
use crate::query::QueryKind;

/// Value of the `source` metadata field.
pub const SOURCE: &str = "sql_database";

/// Text of the record returned when extraction produced nothing.
pub const NO_DATA_TEXT: &str = "No data was found for the specified query.";

/// Text plus optional metadata, the single result of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<OutputMetadata>,
}

/// Describes the query behind an [`OutputRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub query_type: QueryKind,
    pub table_name: String,
    pub num_records: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_columns: Vec<String>,
    pub source: String,
    /// Literal SQL that ran.
    pub query: String,
    /// Report strategy; absent for extractions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportStyle>,
    /// Result columns; reports only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

impl OutputMetadata {
    /// Metadata with the fields common to both pipelines.
    pub fn new(query_type: QueryKind, table_name: &str, query: &str, num_records: u64) -> Self {
        Self {
            query_type,
            table_name: table_name.to_string(),
            num_records,
            content_columns: Vec::new(),
            context_columns: Vec::new(),
            source: SOURCE.to_string(),
            query: query.to_string(),
            format: None,
            columns: Vec::new(),
        }
    }

    pub fn with_column_spec(mut self, content: &[String], context: &[String]) -> Self {
        self.content_columns = content.to_vec();
        self.context_columns = context.to_vec();
        self
    }

    pub fn with_report(mut self, format: ReportStyle, columns: Vec<String>) -> Self {
        self.format = Some(format);
        self.columns = columns;
        self
    }
}

impl OutputRecord {
    /// A record carrying metadata.
    pub fn new(text: impl Into<String>, metadata: OutputMetadata) -> Self {
        Self {
            text: text.into(),
            metadata: Some(metadata),
        }
    }

    /// A record with text only.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    /// The fixed record for an extraction that produced no blocks.
    pub fn no_data() -> Self {
        Self::text_only(NO_DATA_TEXT)
    }

    /// The record that replaces any failed invocation.
    pub fn error(error: &DigestError) -> Self {
        Self::text_only(format!("Error processing data: {error}"))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> Option<&OutputMetadata> {
        self.metadata.as_ref()
    }

    /// Serializes the whole record as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
