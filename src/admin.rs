//! `senti status` and `senti dump`: introspection from the command line.
//!
//! Both commands read the same query log the server writes, so they can be
//! pointed at a live database. `uptime` reported here is the lifetime of
//! the command itself, which is why the CLI excludes it by default.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use sentiment_harness_core::status::{ServiceInfo, StatusAggregator, StatusQuery};
use sentiment_harness_core::store::QueryLog;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_log::SqliteQueryLog;

/// Run `senti status`: print a status snapshot as JSON.
pub async fn run_status(config: &Config, query: &StatusQuery) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let log: Arc<dyn QueryLog> = Arc::new(SqliteQueryLog::new(pool.clone()));
    let info = Arc::new(ServiceInfo::new(config.service.name.clone()));
    let snapshot = StatusAggregator::new(info, log).status(query).await;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    pool.close().await;
    Ok(())
}

/// Run `senti dump <table>`: print every row of a whitelisted table.
pub async fn run_dump(config: &Config, table_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let log = SqliteQueryLog::new(pool.clone());
    let rows = log.dump(table_name).await;
    pool.close().await;

    let rows = rows?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "contents": rows }))?
    );
    Ok(())
}
