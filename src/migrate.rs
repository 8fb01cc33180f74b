//! Schema migrations for the query log.
//!
//! Idempotent: every statement uses `IF NOT EXISTS`, so `senti init` and
//! server startup can both run it.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the `queries` table and its timestamp index on an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queries (
            query_id INTEGER PRIMARY KEY ASC,
            timestamp TEXT NOT NULL,
            parameters TEXT NOT NULL,
            response TEXT NOT NULL,
            process_time REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // request_count scans a trailing timestamp range
    sqlx::query("CREATE INDEX IF NOT EXISTS queries_timestamp ON queries(timestamp)")
        .execute(pool)
        .await?;

    Ok(())
}
