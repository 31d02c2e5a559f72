//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the MySQL dialect to parse SQL and classify
//! statements by their safety level.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::error::{DigestError, Result};

use super::{ClassificationResult, SafetyLevel};

/// SQL classifier that parses and classifies SQL queries.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: MySqlDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }

    /// Classifies a SQL string.
    ///
    /// Multiple statements take the most dangerous classification. An empty
    /// or unparseable string is an error.
    pub fn classify(&self, sql: &str) -> Result<ClassificationResult> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| DigestError::query(format!("SQL parse error: {e}")))?;

        statements
            .iter()
            .map(classify_statement)
            .max_by_key(|result| result.level.priority())
            .ok_or_else(|| DigestError::query("Empty SQL statement"))
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Result<ClassificationResult> {
    SqlClassifier::new().classify(sql)
}

fn most_dangerous(a: ClassificationResult, b: ClassificationResult) -> ClassificationResult {
    if b.level.priority() > a.level.priority() {
        b
    } else {
        a
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> ClassificationResult {
    match statement {
        // Query: may contain data-modifying CTEs, so recurse
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE executes the statement
                ClassificationResult::new(classify_statement(statement).level, "EXPLAIN")
            } else {
                ClassificationResult::new(SafetyLevel::Safe, "EXPLAIN")
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. } => ClassificationResult::new(SafetyLevel::Safe, "SHOW"),
        Statement::ExplainTable { .. } => ClassificationResult::new(SafetyLevel::Safe, "DESCRIBE"),

        Statement::Insert(_) => ClassificationResult::new(SafetyLevel::Mutating, "INSERT"),
        Statement::Update { .. } => ClassificationResult::new(SafetyLevel::Mutating, "UPDATE"),

        Statement::Delete(_) => ClassificationResult::new(SafetyLevel::Destructive, "DELETE"),
        Statement::Drop { .. } => ClassificationResult::new(SafetyLevel::Destructive, "DROP"),
        Statement::Truncate { .. } => {
            ClassificationResult::new(SafetyLevel::Destructive, "TRUNCATE")
        }
        Statement::AlterTable { .. } => {
            ClassificationResult::new(SafetyLevel::Destructive, "ALTER")
        }

        // Conservative default: treat unknown statements as destructive
        _ => ClassificationResult::new(SafetyLevel::Destructive, "UNKNOWN"),
    }
}

/// Classifies a Query by inspecting CTEs and the body for data modification.
fn classify_query(query: &Query) -> ClassificationResult {
    let mut result = ClassificationResult::new(SafetyLevel::Safe, "SELECT");

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            result = most_dangerous(result, classify_query(&cte.query));
        }
    }

    most_dangerous(result, classify_set_expr(&query.body))
}

fn classify_set_expr(set_expr: &SetExpr) -> ClassificationResult {
    match set_expr {
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => select
            .from
            .iter()
            .map(classify_table_with_joins)
            .fold(
                ClassificationResult::new(SafetyLevel::Safe, "SELECT"),
                most_dangerous,
            ),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => {
            ClassificationResult::new(SafetyLevel::Safe, "SELECT")
        }
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        #[allow(unreachable_patterns)]
        _ => ClassificationResult::new(SafetyLevel::Destructive, "UNKNOWN"),
    }
}

fn classify_table_with_joins(twj: &TableWithJoins) -> ClassificationResult {
    twj.joins
        .iter()
        .map(|join| classify_table_factor(&join.relation))
        .fold(classify_table_factor(&twj.relation), most_dangerous)
}

/// Derived tables (subqueries) are classified recursively.
fn classify_table_factor(factor: &TableFactor) -> ClassificationResult {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => ClassificationResult::new(SafetyLevel::Safe, "SELECT"),
    }
}
