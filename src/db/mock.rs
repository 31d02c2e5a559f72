//! Mock database clients for testing.
//!
//! `MockDatabaseClient` keeps tables in memory and answers the simple
//! single-table `SELECT` shapes the pipelines generate. `FailingDatabaseClient`
//! rejects everything as if the server had gone away.

use super::{ChunkStream, ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sqlparser::ast::{Expr, SelectItem, SetExpr, Statement, TableFactor};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client backed by in-memory tables.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    tables: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
    chunks_pulled: Arc<AtomicUsize>,
    fail_after_chunks: Option<usize>,
    closed: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table built from column names and rows.
    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Row>) -> Self {
        let columns = columns
            .iter()
            .map(|c| ColumnInfo::new(*c, "VARCHAR"))
            .collect();
        self.tables
            .insert(name.to_string(), QueryResult::with_data(columns, rows));
        self
    }

    /// Makes chunked fetches fail after `n` chunks have been delivered.
    pub fn fail_after_chunks(mut self, n: usize) -> Self {
        self.fail_after_chunks = Some(n);
        self
    }

    /// Returns every SQL statement received so far, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Returns how many chunks callers have pulled from chunked fetches.
    pub fn chunks_pulled(&self) -> usize {
        self.chunks_pulled.load(Ordering::SeqCst)
    }

    /// Returns how many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str) {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
    }

    /// Evaluates a single-table SELECT against the in-memory tables.
    fn run_select(&self, sql: &str) -> Result<QueryResult> {
        let statements = Parser::parse_sql(&MySqlDialect {}, sql).map_err(|e| {
            DigestError::query(format!(
                "ERROR 1064 (42000): You have an error in your SQL syntax: {e}"
            ))
        })?;

        let [Statement::Query(query)] = statements.as_slice() else {
            return Err(DigestError::query("mock only supports a single SELECT"));
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Err(DigestError::query("mock only supports plain SELECT"));
        };

        let limit = match &query.limit {
            Some(Expr::Value(sqlparser::ast::Value::Number(n, _))) => Some(
                n.parse::<usize>()
                    .map_err(|_| DigestError::query(format!("invalid LIMIT {n}")))?,
            ),
            Some(other) => return Err(DigestError::query(format!("unsupported LIMIT {other}"))),
            None => None,
        };

        let source = match select.from.as_slice() {
            [] => None,
            [from] => {
                let TableFactor::Table { name, .. } = &from.relation else {
                    return Err(DigestError::query("mock only supports plain tables"));
                };
                let table_name = name.to_string().replace('`', "");
                let table = self.tables.get(&table_name).ok_or_else(|| {
                    DigestError::query(format!(
                        "ERROR 1146 (42S02): Table '{table_name}' doesn't exist"
                    ))
                })?;
                Some(table)
            }
            _ => return Err(DigestError::query("mock does not support joins")),
        };

        let empty = QueryResult::with_data(Vec::new(), vec![Vec::new()]);
        let source = source.unwrap_or(&empty);

        let mut columns = Vec::new();
        let mut pickers: Vec<Picker> = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::Wildcard(_) => {
                    for (i, col) in source.columns.iter().enumerate() {
                        columns.push(col.clone());
                        pickers.push(Picker::Column(i));
                    }
                }
                SelectItem::UnnamedExpr(expr) => {
                    let (info, picker) = resolve(expr, source)?;
                    columns.push(info);
                    pickers.push(picker);
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    let (info, picker) = resolve(expr, source)?;
                    columns.push(ColumnInfo::new(alias.value.clone(), info.data_type));
                    pickers.push(picker);
                }
                other => {
                    return Err(DigestError::query(format!("unsupported projection {other}")))
                }
            }
        }

        let rows: Vec<Row> = source
            .rows
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| pickers.iter().map(|p| p.pick(row)).collect())
            .collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
    }
}

/// How one output column is produced from a source row.
enum Picker {
    Column(usize),
    Constant(Value),
}

impl Picker {
    fn pick(&self, row: &Row) -> Value {
        match self {
            Picker::Column(i) => row.get(*i).cloned().unwrap_or_default(),
            Picker::Constant(v) => v.clone(),
        }
    }
}

fn resolve(expr: &Expr, source: &QueryResult) -> Result<(ColumnInfo, Picker)> {
    match expr {
        Expr::Identifier(ident) => {
            let index = source.column_index(&ident.value).ok_or_else(|| {
                DigestError::query(format!(
                    "ERROR 1054 (42S22): Unknown column '{}' in 'field list'",
                    ident.value
                ))
            })?;
            Ok((source.columns[index].clone(), Picker::Column(index)))
        }
        Expr::Value(sqlparser::ast::Value::Number(n, _)) => {
            let value = n
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(n.clone()));
            Ok((ColumnInfo::new(n.clone(), "BIGINT"), Picker::Constant(value)))
        }
        other => Err(DigestError::query(format!("unsupported expression {other}"))),
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);
        self.run_select(sql)
    }

    fn fetch_chunks<'a>(&'a self, sql: &'a str, batch_size: usize) -> ChunkStream<'a> {
        self.record(sql);
        let result = match self.run_select(sql) {
            Ok(result) => result,
            Err(e) => return stream::iter(vec![Err(e)]).boxed(),
        };

        let mut chunks: Vec<Result<QueryResult>> = result
            .rows
            .chunks(batch_size.max(1))
            .map(|rows| Ok(QueryResult::with_data(result.columns.clone(), rows.to_vec())))
            .collect();

        if let Some(n) = self.fail_after_chunks {
            chunks.truncate(n);
            chunks.push(Err(DigestError::connection(
                "Lost connection to MySQL server during query",
            )));
        }

        let pulled = Arc::clone(&self.chunks_pulled);
        stream::iter(chunks)
            .inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A database client whose every call fails with a connection error.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

impl FailingDatabaseClient {
    pub fn new() -> Self {
        Self
    }

    fn error() -> DigestError {
        DigestError::connection("Can't connect to MySQL server on 'db.invalid:3306'")
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(Self::error())
    }

    fn fetch_chunks<'a>(&'a self, _sql: &'a str, _batch_size: usize) -> ChunkStream<'a> {
        stream::iter(vec![Err(Self::error())]).boxed()
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
