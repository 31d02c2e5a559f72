//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! for MySQL and MariaDB servers using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ChunkStream, ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::StreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Connections older than this are recycled by the pool.
const MAX_CONNECTION_LIFETIME_SECS: u64 = 3600;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Opens a pool for the given configuration, retrying transient failures.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = MySqlConnectOptions::from_str(&conn_str)
            .map_err(|e| DigestError::config(format!("Invalid connection string: {e}")))?
            .charset(&config.charset);

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = MySqlPoolOptions::new()
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(10))
                .max_lifetime(Duration::from_secs(MAX_CONNECTION_LIFETIME_SECS))
                .test_before_acquire(true)
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    debug!("Successfully connected to database");
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        last_error = Some(e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        return Err(map_connection_error(e, config));
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(map_connection_error(e, config)),
            None => Err(DigestError::internal("no connection attempt was made")),
        }
    }

    /// Column metadata for a statement, without fetching any rows.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe query columns: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            DigestError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(map_query_error)?;

        let execution_time = start.elapsed();

        let columns = match result.first() {
            Some(first_row) => column_info(first_row),
            None => self.describe_columns(sql).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    fn fetch_chunks<'a>(&'a self, sql: &'a str, batch_size: usize) -> ChunkStream<'a> {
        sqlx::query(sql)
            .fetch(&self.pool)
            .chunks(batch_size.max(1))
            .map(|batch| {
                let start = Instant::now();
                let rows = batch
                    .into_iter()
                    .collect::<std::result::Result<Vec<MySqlRow>, sqlx::Error>>()
                    .map_err(map_query_error)?;

                let columns = rows.first().map(column_info).unwrap_or_default();
                let rows = rows.iter().map(convert_row).collect();

                Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
            })
            .boxed()
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn column_info(row: &MySqlRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let type_name = type_name.to_uppercase();
    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index).map(Value::from),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index).map(Value::from)
        }

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index).map(Value::from),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| Value::from(v.map(f64::from))),

        "DOUBLE" => row.try_get::<Option<f64>, _>(index).map(Value::from),

        // Sent as a two-byte integer in the binary protocol.
        "YEAR" => row
            .try_get::<Option<u16>, _>(index)
            .or_else(|_| row.try_get_unchecked::<Option<u16>, _>(index))
            .map(|v| Value::from(v.map(u64::from))),

        "DATE" => row.try_get::<Option<NaiveDate>, _>(index).map(Value::from),

        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(Value::from),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map(Value::Time).unwrap_or(Value::Null)),

        _ => row.try_get::<Option<String>, _>(index).map(Value::from),
    };

    decoded.unwrap_or_else(|e| {
        if is_temporal(&type_name) {
            // Zero dates and TIME values outside a day have no chrono form.
            debug!("Could not decode {} column {}: {}", type_name, index, e);
            Value::Null
        } else {
            convert_unchecked(row, index)
        }
    })
}

/// Types whose binary encoding is not text, so the unchecked fallback
/// would produce garbage.
fn is_temporal(type_name: &str) -> bool {
    matches!(type_name, "DATE" | "DATETIME" | "TIMESTAMP" | "TIME")
}

/// Fallback for types without a typed decoder (DECIMAL, JSON, binary strings).
///
/// The binary protocol sends these as length-prefixed bytes.
fn convert_unchecked(row: &MySqlRow, index: usize) -> Value {
    if let Ok(text) = row.try_get_unchecked::<Option<String>, _>(index) {
        return Value::from(text);
    }
    row.try_get_unchecked::<Option<Vec<u8>>, _>(index)
        .ok()
        .flatten()
        .map(Value::Bytes)
        .unwrap_or(Value::Null)
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("access denied") || error_str.contains("unknown database") {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("too many connections")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-facing messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> DigestError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        DigestError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        DigestError::connection(format!(
            "Access denied for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        DigestError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        DigestError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        DigestError::connection(error.to_string())
    }
}

/// Maps a query-time sqlx error, keeping connection failures distinct.
fn map_query_error(error: sqlx::Error) -> DigestError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DigestError::connection(error.to_string())
        }
        other => DigestError::query(format_query_error(other)),
    }
}

/// Formats a query error in the `ERROR <number> (<sqlstate>): <message>` shape
/// used by the mysql command-line client.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    match db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
        Some(mysql_error) => match mysql_error.code() {
            Some(state) => format!(
                "ERROR {} ({}): {}",
                mysql_error.number(),
                state,
                mysql_error.message()
            ),
            None => format!("ERROR {}: {}", mysql_error.number(), mysql_error.message()),
        },
        None => format!("ERROR: {}", db_error.message()),
    }
}
