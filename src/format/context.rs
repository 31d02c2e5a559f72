//! Context-preserving formatter.
//!
//! Every non-blank content value becomes one block:
//!
//! ```text
//! CONTEXT: {"post_id": "7", "author": "ana"}
//! CONTENT: first!
//! ===
//! ```

use serde::ser::{Serialize, Serializer};
use std::io;

use crate::db::{QueryResult, Row, Value};
use crate::error::{DigestError, Result};
use crate::query::ColumnSpec;

/// Line that closes every block.
pub const BLOCK_SEPARATOR: &str = "===";

/// Formats chunks so that each content value travels with its row context.
#[derive(Debug, Clone, Copy)]
pub struct ContextFormatter<'a> {
    columns: &'a ColumnSpec,
}

impl<'a> ContextFormatter<'a> {
    pub fn new(columns: &'a ColumnSpec) -> Self {
        Self { columns }
    }

    /// Renders one chunk. Rows whose content columns are all blank add nothing.
    pub fn format_chunk(&self, chunk: &QueryResult) -> Result<String> {
        let content = resolve(chunk, self.columns.content())?;
        let context = resolve(chunk, self.columns.context())?;

        let mut text = String::new();
        for row in &chunk.rows {
            let snapshot = Snapshot(
                context
                    .iter()
                    .map(|(name, i)| (*name, cell(row, *i).to_display_string()))
                    .collect(),
            );
            let snapshot = to_json(&snapshot)?;

            for (_, i) in &content {
                let value = cell(row, *i);
                if value.is_blank() {
                    continue;
                }
                text.push_str("CONTEXT: ");
                text.push_str(&snapshot);
                text.push_str("\nCONTENT: ");
                text.push_str(&value.to_display_string());
                text.push('\n');
                text.push_str(BLOCK_SEPARATOR);
                text.push('\n');
            }
        }
        Ok(text)
    }
}

/// Maps column names to positions in the chunk.
fn resolve<'n>(chunk: &QueryResult, names: &'n [String]) -> Result<Vec<(&'n str, usize)>> {
    names
        .iter()
        .map(|name| {
            chunk
                .column_index(name)
                .map(|i| (name.as_str(), i))
                .ok_or_else(|| {
                    DigestError::format(format!("column '{name}' is not in the result set"))
                })
        })
        .collect()
}

static NULL: Value = Value::Null;

fn cell(row: &Row, index: usize) -> &Value {
    row.get(index).unwrap_or(&NULL)
}

/// Context values keyed by column name, first occurrence wins, in column order.
struct Snapshot<'a>(Vec<(&'a str, String)>);

impl Serialize for Snapshot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.0.len());
        let unique = self.0.iter().filter(|(key, _)| {
            if seen.contains(key) {
                return false;
            }
            seen.push(*key);
            true
        });
        serializer.collect_map(unique.map(|(key, value)| (*key, value)))
    }
}

/// JSON with `", "` and `": "` separators and raw (unescaped) non-ASCII text.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| DigestError::format(e.to_string()))
}
