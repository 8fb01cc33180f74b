//! SQLite-backed [`QueryLog`] implementation.
//!
//! Timestamps are produced by SQLite itself (`strftime('%Y-%m-%d
//! %H:%M:%f', 'now')`, UTC with millisecond precision) so inserts and
//! window queries share one clock. Text timestamps of that fixed width
//! compare correctly as strings, which lets `request_count` use the
//! `queries_timestamp` index.
//!
//! Each append is a single autocommitted `INSERT`. SQLite holds the write
//! lock while assigning the rowid, and WAL readers only ever see committed
//! rows, so ids are unique, increasing, and never observed half-written.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};

use sentiment_harness_core::models::QueryLogEntry;
use sentiment_harness_core::store::{check_dumpable, QueryLog, TIMESTAMP_FORMAT};

/// Parse layout for stored timestamps; accepts any fractional precision.
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Longest window with an explicit lower edge (about 1900 years). SQLite
/// date functions return NULL before year 0000, so longer windows count
/// every row up to `now`.
const MAX_BOUNDED_WINDOW_SECS: f64 = 60_000_000_000.0;

/// SQLite implementation of the [`QueryLog`] trait over the `queries` table.
pub struct SqliteQueryLog {
    pool: SqlitePool,
}

impl SqliteQueryLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// [`QueryLog::request_count`] evaluated at a fixed `now`.
    pub async fn request_count_at(&self, window_seconds: f64, now: NaiveDateTime) -> Result<i64> {
        let now = now.format(TIMESTAMP_FORMAT).to_string();
        self.count_window(&now, window_seconds).await
    }

    /// Count rows in `[now - window_seconds, now]`, where `now` is any SQLite
    /// time value (`'now'` or a timestamp string).
    async fn count_window(&self, now: &str, window_seconds: f64) -> Result<i64> {
        let window = window_seconds.max(0.0);
        let count: i64 = if window <= MAX_BOUNDED_WINDOW_SECS {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM queries
                WHERE timestamp >= strftime('%Y-%m-%d %H:%M:%f', ?, ?)
                  AND timestamp <= strftime('%Y-%m-%d %H:%M:%f', ?)
                "#,
            )
            .bind(now)
            .bind(format!("-{:.4} seconds", window))
            .bind(now)
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM queries
                WHERE timestamp <= strftime('%Y-%m-%d %H:%M:%f', ?)
                "#,
            )
            .bind(now)
            .fetch_one(&self.pool)
            .await
        }
        .context("Failed to count recent requests")?;

        Ok(count)
    }
}

#[async_trait]
impl QueryLog for SqliteQueryLog {
    async fn append(&self, parameters: &str, response: &str, process_time_ms: f64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO queries (timestamp, parameters, response, process_time)
            VALUES (strftime('%Y-%m-%d %H:%M:%f', 'now'), ?, ?, ?)
            "#,
        )
        .bind(parameters)
        .bind(response)
        .bind(process_time_ms)
        .execute(&self.pool)
        .await
        .context("Failed to append to query log")?;

        Ok(result.last_insert_rowid())
    }

    async fn avg_process_time(&self, n: usize) -> Result<f64> {
        let avg: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(process_time)
            FROM (SELECT process_time FROM queries ORDER BY query_id DESC LIMIT ?)
            "#,
        )
        .bind(i64::try_from(n).unwrap_or(i64::MAX))
        .fetch_one(&self.pool)
        .await
        .context("Failed to read average process time")?;

        Ok(avg.unwrap_or(0.0))
    }

    async fn request_count(&self, window_seconds: f64) -> Result<i64> {
        self.count_window("now", window_seconds).await
    }

    async fn dump(&self, table_name: &str) -> Result<Vec<QueryLogEntry>> {
        check_dumpable(table_name)?;

        let rows = sqlx::query(
            r#"
            SELECT query_id, timestamp, parameters, response, process_time
            FROM queries
            ORDER BY query_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to dump query log")?;

        rows.iter()
            .map(|row| {
                let raw_ts: String = row.get("timestamp");
                let timestamp = NaiveDateTime::parse_from_str(&raw_ts, STORED_TIMESTAMP_FORMAT)
                    .with_context(|| format!("Malformed timestamp in query log: {}", raw_ts))?;
                Ok(QueryLogEntry {
                    query_id: row.get("query_id"),
                    timestamp,
                    parameters: row.get("parameters"),
                    response: row.get("response"),
                    process_time_ms: row.get("process_time"),
                })
            })
            .collect()
    }
}
