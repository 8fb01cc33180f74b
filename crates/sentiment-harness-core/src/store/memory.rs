//! In-memory [`QueryLog`] implementation for tests and embedded use.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Appends take the
//! write guard for id assignment and the push together, so readers never
//! see a gap or a half-built entry.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta, Utc};

use crate::models::QueryLogEntry;

use super::{check_dumpable, QueryLog};

pub struct InMemoryQueryLog {
    entries: RwLock<Vec<QueryLogEntry>>,
}

impl InMemoryQueryLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append with an explicit timestamp.
    ///
    /// Timestamps are kept non-decreasing: a `timestamp` older than the
    /// latest entry is raised to match it.
    pub fn append_at(
        &self,
        timestamp: NaiveDateTime,
        parameters: &str,
        response: &str,
        process_time_ms: f64,
    ) -> Result<i64> {
        let mut entries = self.write()?;
        let (query_id, timestamp) = match entries.last() {
            Some(last) => (last.query_id + 1, timestamp.max(last.timestamp)),
            None => (1, timestamp),
        };
        entries.push(QueryLogEntry {
            query_id,
            timestamp,
            parameters: parameters.to_string(),
            response: response.to_string(),
            process_time_ms,
        });
        Ok(query_id)
    }

    /// [`QueryLog::request_count`] evaluated at a fixed `now`.
    ///
    /// A window reaching past the representable calendar has no lower edge.
    pub fn request_count_at(&self, window_seconds: f64, now: NaiveDateTime) -> Result<i64> {
        // `as` saturates, so huge or infinite windows become i64::MAX.
        let micros = (window_seconds.max(0.0) * 1_000_000.0) as i64;
        let lower = now.checked_sub_signed(TimeDelta::microseconds(micros));
        let entries = self.read()?;
        let count = entries
            .iter()
            .filter(|e| e.timestamp <= now && lower.map_or(true, |lower| e.timestamp >= lower))
            .count();
        Ok(count as i64)
    }

    pub fn len(&self) -> usize {
        self.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<QueryLogEntry>>> {
        self.entries
            .read()
            .map_err(|_| anyhow!("query log lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<QueryLogEntry>>> {
        self.entries
            .write()
            .map_err(|_| anyhow!("query log lock poisoned"))
    }
}

impl Default for InMemoryQueryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryLog for InMemoryQueryLog {
    async fn append(&self, parameters: &str, response: &str, process_time_ms: f64) -> Result<i64> {
        self.append_at(Utc::now().naive_utc(), parameters, response, process_time_ms)
    }

    async fn avg_process_time(&self, n: usize) -> Result<f64> {
        let entries = self.read()?;
        let recent = &entries[entries.len().saturating_sub(n)..];
        if recent.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = recent.iter().map(|e| e.process_time_ms).sum();
        Ok(total / recent.len() as f64)
    }

    async fn request_count(&self, window_seconds: f64) -> Result<i64> {
        self.request_count_at(window_seconds, Utc::now().naive_utc())
    }

    async fn dump(&self, table_name: &str) -> Result<Vec<QueryLogEntry>> {
        check_dumpable(table_name)?;
        Ok(self.read()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::SentimentError;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, super::super::TIMESTAMP_FORMAT).unwrap()
    }

    #[tokio::test]
    async fn test_empty_log_aggregates() {
        let log = InMemoryQueryLog::new();
        assert_eq!(log.avg_process_time(100).await.unwrap(), 0.0);
        assert_eq!(log.request_count(60.0).await.unwrap(), 0);
        assert!(log.dump("queries").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let log = InMemoryQueryLog::new();
        let a = log.append("{}", "{}", 1.0).await.unwrap();
        let b = log.append("{}", "{}", 2.0).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[tokio::test]
    async fn test_avg_honors_window() {
        let log = InMemoryQueryLog::new();
        for t in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            log.append("{}", "{}", t).await.unwrap();
        }
        assert_eq!(log.avg_process_time(1).await.unwrap(), 60.0);
        assert_eq!(log.avg_process_time(2).await.unwrap(), 55.0);
        assert_eq!(log.avg_process_time(5).await.unwrap(), 40.0);
        assert_eq!(log.avg_process_time(0).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_avg_with_fewer_entries_than_window() {
        let log = InMemoryQueryLog::new();
        log.append("{}", "{}", 3.0).await.unwrap();
        log.append("{}", "{}", 5.0).await.unwrap();
        assert_eq!(log.avg_process_time(100).await.unwrap(), 4.0);
    }

    #[test]
    fn test_request_count_lower_edge_inclusive() {
        let log = InMemoryQueryLog::new();
        log.append_at(ts("2026-01-01 12:00:00.000"), "{}", "{}", 1.0).unwrap();
        log.append_at(ts("2026-01-01 12:00:30.000"), "{}", "{}", 1.0).unwrap();
        log.append_at(ts("2026-01-01 12:01:00.000"), "{}", "{}", 1.0).unwrap();

        let now = ts("2026-01-01 12:01:00.000");
        assert_eq!(log.request_count_at(60.0, now).unwrap(), 3);
        assert_eq!(log.request_count_at(59.999, now).unwrap(), 2);
        assert_eq!(log.request_count_at(0.0, now).unwrap(), 1);
        assert_eq!(log.request_count_at(-5.0, now).unwrap(), 1);
    }

    #[test]
    fn test_request_count_monotonic_in_window() {
        let log = InMemoryQueryLog::new();
        for s in ["00.000", "05.500", "10.250", "20.000", "40.000"] {
            log.append_at(ts(&format!("2026-01-01 12:00:{}", s)), "{}", "{}", 1.0)
                .unwrap();
        }
        let now = ts("2026-01-01 12:00:45.000");
        let mut last = 0;
        for window in [0.0, 1.0, 5.0, 25.0, 34.75, 39.5, 45.0, 1000.0, 1e12, f64::MAX] {
            let count = log.request_count_at(window, now).unwrap();
            assert!(count >= last, "count dropped at window {}", window);
            last = count;
        }
        assert_eq!(last, 5);
    }

    #[tokio::test]
    async fn test_request_count_huge_window_counts_everything() {
        let log = InMemoryQueryLog::new();
        log.append_at(ts("1999-12-31 23:59:59.999"), "{}", "{}", 1.0).unwrap();
        log.append("{}", "{}", 1.0).await.unwrap();

        for window in [1e12, 1e13, 1e20, f64::MAX, f64::INFINITY] {
            assert_eq!(log.request_count(window).await.unwrap(), 2, "window {}", window);
        }
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let log = InMemoryQueryLog::new();
        log.append_at(ts("2026-01-01 12:00:10.000"), "{}", "{}", 1.0).unwrap();
        log.append_at(ts("2026-01-01 12:00:05.000"), "{}", "{}", 1.0).unwrap();
        let entries = log.read().unwrap();
        assert!(entries[1].timestamp >= entries[0].timestamp);
    }

    #[tokio::test]
    async fn test_dump_rejects_unknown_table() {
        let log = InMemoryQueryLog::new();
        let err = log.dump("sqlite_master").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SentimentError>(),
            Some(&SentimentError::TableNotFound("sqlite_master".into()))
        );
    }

    #[tokio::test]
    async fn test_dump_in_insertion_order() {
        let log = InMemoryQueryLog::new();
        log.append("{\"n\":1}", "{}", 1.0).await.unwrap();
        log.append("{\"n\":2}", "{}", 2.0).await.unwrap();
        let rows = log.dump("queries").await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.query_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(rows[1].parameters, "{\"n\":2}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_unique_ids() {
        let log = Arc::new(InMemoryQueryLog::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append("{}", "{}", i as f64).await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
    }
}
