//! SQLite query log backend against a scratch database.

use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

use sentiment_harness::config::Config;
use sentiment_harness::{db, migrate};
use sentiment_harness::sqlite_log::SqliteQueryLog;
use sentiment_harness_core::error::SentimentError;
use sentiment_harness_core::store::QueryLog;

async fn open_pool(tmp: &TempDir) -> SqlitePool {
    let content = format!(
        "[db]\npath = \"{}/data/senti.sqlite\"\n\n[server]\nbind = \"127.0.0.1:0\"\n",
        tmp.path().display()
    );
    let cfg = Config::from_toml(&content).unwrap();
    migrate::run_migrations(&cfg).await.unwrap();
    db::connect(&cfg).await.unwrap()
}

async fn open_log(tmp: &TempDir) -> SqliteQueryLog {
    SqliteQueryLog::new(open_pool(tmp).await)
}

async fn insert_at(pool: &SqlitePool, timestamp: &str) {
    sqlx::query(
        "INSERT INTO queries (timestamp, parameters, response, process_time) VALUES (?, '{}', '{}', 1.0)",
    )
    .bind(timestamp)
    .execute(pool)
    .await
    .unwrap();
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
}

#[tokio::test]
async fn test_append_assigns_increasing_ids() {
    let tmp = TempDir::new().unwrap();
    let log = open_log(&tmp).await;

    let a = log.append("{}", "{}", 1.0).await.unwrap();
    let b = log.append("{}", "{}", 2.0).await.unwrap();
    let c = log.append("{}", "{}", 3.0).await.unwrap();
    assert!(a < b && b < c);
}

#[tokio::test]
async fn test_avg_over_trailing_window() {
    let tmp = TempDir::new().unwrap();
    let log = open_log(&tmp).await;

    assert_eq!(log.avg_process_time(10).await.unwrap(), 0.0);

    for t in [10.0, 20.0, 30.0, 40.0] {
        log.append("{}", "{}", t).await.unwrap();
    }
    assert_eq!(log.avg_process_time(1).await.unwrap(), 40.0);
    assert_eq!(log.avg_process_time(2).await.unwrap(), 35.0);
    assert_eq!(log.avg_process_time(100).await.unwrap(), 25.0);
    assert_eq!(log.avg_process_time(0).await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_request_count_window() {
    let tmp = TempDir::new().unwrap();
    let pool = open_pool(&tmp).await;
    let log = SqliteQueryLog::new(pool.clone());

    log.append("{}", "{}", 1.0).await.unwrap();
    log.append("{}", "{}", 1.0).await.unwrap();

    assert_eq!(log.request_count(60.0).await.unwrap(), 2);

    // Entries a day old fall outside a one-minute window.
    sqlx::query("INSERT INTO queries (timestamp, parameters, response, process_time) VALUES (strftime('%Y-%m-%d %H:%M:%f', 'now', '-1 day'), '{}', '{}', 1.0)")
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(log.request_count(60.0).await.unwrap(), 2);
    assert_eq!(log.request_count(2.0 * 86_400.0).await.unwrap(), 3);
}

#[tokio::test]
async fn test_request_count_lower_edge_inclusive() {
    let tmp = TempDir::new().unwrap();
    let pool = open_pool(&tmp).await;
    let log = SqliteQueryLog::new(pool.clone());

    insert_at(&pool, "2026-01-01 12:00:00.000").await;
    insert_at(&pool, "2026-01-01 12:00:30.000").await;
    insert_at(&pool, "2026-01-01 12:01:00.000").await;

    let now = ts("2026-01-01 12:01:00.000");
    assert_eq!(log.request_count_at(60.0, now).await.unwrap(), 3);
    assert_eq!(log.request_count_at(59.999, now).await.unwrap(), 2);
    assert_eq!(log.request_count_at(0.0, now).await.unwrap(), 1);
    assert_eq!(log.request_count_at(-5.0, now).await.unwrap(), 1);
}

#[tokio::test]
async fn test_request_count_never_drops_as_window_grows() {
    let tmp = TempDir::new().unwrap();
    let pool = open_pool(&tmp).await;
    let log = SqliteQueryLog::new(pool.clone());

    insert_at(&pool, "1970-01-01 00:00:00.000").await;
    sqlx::query("INSERT INTO queries (timestamp, parameters, response, process_time) VALUES (strftime('%Y-%m-%d %H:%M:%f', 'now', '-1 hour'), '{}', '{}', 1.0)")
        .execute(&pool)
        .await
        .unwrap();
    log.append("{}", "{}", 1.0).await.unwrap();

    let mut last = 0;
    for window in [
        0.0, 1.0, 60.0, 7_200.0, 1e9, 1e10, 1e11, 1e12, 1e20, f64::MAX, f64::INFINITY,
    ] {
        let count = log.request_count(window).await.unwrap();
        assert!(count >= last, "count dropped from {} to {} at window {}", last, count, window);
        last = count;
    }
    assert_eq!(last, 3);
    assert_eq!(log.request_count(1e12).await.unwrap(), 3);
}

#[tokio::test]
async fn test_dump_is_ordered_and_whitelisted() {
    let tmp = TempDir::new().unwrap();
    let log = open_log(&tmp).await;

    log.append(r#"{"form":{"text":"one"}}"#, r#"{"process_time":1.5}"#, 1.5)
        .await
        .unwrap();
    log.append(r#"{"form":{"text":"two"}}"#, r#"{"process_time":2.5}"#, 2.5)
        .await
        .unwrap();

    let rows = log.dump("queries").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].query_id < rows[1].query_id);
    assert!(rows[0].timestamp <= rows[1].timestamp);
    assert_eq!(rows[1].process_time_ms, 2.5);

    let params: Value = serde_json::from_str(&rows[0].parameters).unwrap();
    assert_eq!(params["form"]["text"], "one");

    let err = log.dump("sqlite_master").await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SentimentError>(),
        Some(&SentimentError::TableNotFound("sqlite_master".into()))
    );
}

#[tokio::test]
async fn test_concurrent_appends_get_unique_ids() {
    let tmp = TempDir::new().unwrap();
    let log = std::sync::Arc::new(open_log(&tmp).await);

    let mut handles = Vec::new();
    for i in 0..20 {
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
    assert_eq!(ids.len(), 20);
    assert_eq!(log.dump("queries").await.unwrap().len(), 20);
}
