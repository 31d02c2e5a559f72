//! Read-only guard for caller-supplied SQL.
//!
//! Custom queries run verbatim, so they are classified before execution and
//! anything that writes is refused unless the caller opted in.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use crate::error::{DigestError, Result};
use std::fmt;
use tracing::warn;

/// Safety level classification for SQL queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Read-only queries (SELECT, EXPLAIN, SHOW).
    Safe,
    /// Data modification (INSERT, UPDATE, REPLACE).
    Mutating,
    /// Data loss or schema changes (DELETE, DROP, TRUNCATE, ALTER, ...).
    Destructive,
}

impl SafetyLevel {
    /// Returns true for anything other than a read.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Mutating | Self::Destructive)
    }

    pub(crate) fn priority(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Mutating => 1,
            Self::Destructive => 2,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The most dangerous level found across all statements.
    pub level: SafetyLevel,
    /// Keyword of the statement that decided the level, e.g. `DELETE`.
    pub statement: &'static str,
}

impl ClassificationResult {
    pub fn new(level: SafetyLevel, statement: &'static str) -> Self {
        Self { level, statement }
    }
}

/// Refuses SQL that writes, unless `allow_writes` is set.
///
/// SQL the parser does not understand cannot be shown to be read-only, so it
/// is refused as well.
pub fn ensure_read_only(sql: &str, allow_writes: bool) -> Result<()> {
    if allow_writes {
        return Ok(());
    }

    match classify_sql(sql) {
        Ok(result) if result.level.writes() => Err(DigestError::validation(format!(
            "custom query contains a {} statement ({}); set allow_writes to run it",
            result.statement,
            result.level.to_string().to_lowercase()
        ))),
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("Could not classify custom query: {}", e);
            Err(DigestError::validation(format!(
                "custom query could not be verified as read-only ({e}); \
                 set allow_writes to run it"
            )))
        }
    }
}
