//! Text rendering for query results.
//!
//! Two families of formatters live here:
//! - [`ContextFormatter`] pairs every content value with a JSON snapshot of
//!   its row's context columns, chunk by chunk.
//! - [`render_report`] turns a whole table into one report under a
//!   [`ReportStyle`].

mod context;
mod report;

pub use context::ContextFormatter;
pub use report::render_report;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report text for a table without rows.
pub const NO_DATA_MESSAGE: &str = "No data was found in the query.";

/// Rendering strategy for whole-table reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    /// One block per row listing every column.
    #[default]
    Structured,
    /// Sentences describing each row.
    Natural,
    /// Shape, column names and per-column statistics.
    Technical,
}

impl ReportStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Natural => "natural",
            Self::Technical => "technical",
        }
    }
}

impl FromStr for ReportStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "natural" => Ok(Self::Natural),
            "technical" => Ok(Self::Technical),
            _ => Err(format!(
                "Invalid format: {s}. Expected: structured, natural, or technical"
            )),
        }
    }
}

impl fmt::Display for ReportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
