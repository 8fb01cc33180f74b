//! Query log storage abstraction.
//!
//! The [`QueryLog`] trait is the metrics store behind the status endpoint:
//! an append-only log of analysis requests with two trailing-window
//! aggregates and a whitelisted debug dump.
//!
//! Implementations must be `Send + Sync` and must give readers a consistent
//! view: an entry is either fully visible with its final `query_id` or not
//! visible at all.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`append`](QueryLog::append) | Record one request/response pair, returning its id |
//! | [`avg_process_time`](QueryLog::avg_process_time) | Mean processing time of the last `n` entries |
//! | [`request_count`](QueryLog::request_count) | Entries inside a trailing time window |
//! | [`dump`](QueryLog::dump) | All entries of a whitelisted table, in insertion order |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::SentimentError;
use crate::models::QueryLogEntry;

/// Name of the query log table, the only table the debug dump exposes.
pub const QUERY_LOG_TABLE: &str = "queries";

/// Tables [`QueryLog::dump`] may return.
pub const DUMPABLE_TABLES: &[&str] = &[QUERY_LOG_TABLE];

/// Timestamp layout shared by every backend (UTC, millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Reject table names outside [`DUMPABLE_TABLES`].
pub fn check_dumpable(table_name: &str) -> Result<(), SentimentError> {
    if DUMPABLE_TABLES.contains(&table_name) {
        Ok(())
    } else {
        Err(SentimentError::TableNotFound(table_name.to_string()))
    }
}

#[async_trait]
pub trait QueryLog: Send + Sync {
    /// Append an entry stamped with the current time.
    ///
    /// Ids are assigned atomically and strictly increase in commit order.
    async fn append(&self, parameters: &str, response: &str, process_time_ms: f64) -> Result<i64>;

    /// Mean `process_time` of the `n` most recently inserted entries.
    ///
    /// Averages over all entries when fewer than `n` exist; 0.0 when the
    /// log is empty or `n` is 0.
    async fn avg_process_time(&self, n: usize) -> Result<f64>;

    /// Number of entries stamped within `[now - window_seconds, now]`.
    async fn request_count(&self, window_seconds: f64) -> Result<i64>;

    /// Every entry of `table_name`, ordered by `query_id`.
    ///
    /// Fails with [`SentimentError::TableNotFound`] for any name not in
    /// [`DUMPABLE_TABLES`].
    async fn dump(&self, table_name: &str) -> Result<Vec<QueryLogEntry>>;
}
