//! Status introspection over the query log and process identity.
//!
//! A status query selects `available ∩ include − exclude` and evaluates
//! only the metrics in that set, so excluding `avg_response_time` or
//! `num_requests` skips the corresponding store scan entirely.
//!
//! | Key | Source |
//! |-----|--------|
//! | `uptime` | seconds since [`ServiceInfo`] was created |
//! | `num_requests` | [`QueryLog::request_count`] over `time_interval` seconds |
//! | `avg_response_time` | [`QueryLog::avg_process_time`] over `request_interval` entries |
//! | `service_name` | [`ServiceInfo::name`] |
//!
//! A failing store read degrades the affected metric to zero and logs a
//! warning; the other keys are still answered.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::store::QueryLog;

/// Default number of recent entries averaged for `avg_response_time`.
pub const DEFAULT_REQUEST_INTERVAL: usize = 100;
/// Default trailing window, in seconds, for `num_requests`.
pub const DEFAULT_TIME_INTERVAL: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusKey {
    Uptime,
    NumRequests,
    AvgResponseTime,
    ServiceName,
}

impl StatusKey {
    pub const ALL: [StatusKey; 4] = [
        StatusKey::Uptime,
        StatusKey::NumRequests,
        StatusKey::AvgResponseTime,
        StatusKey::ServiceName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Uptime => "uptime",
            StatusKey::NumRequests => "num_requests",
            StatusKey::AvgResponseTime => "avg_response_time",
            StatusKey::ServiceName => "service_name",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown status key: {}", s))
    }
}

/// Process identity, created once at startup.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    name: String,
    started: Instant,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self::started_at(name, Instant::now())
    }

    pub fn started_at(name: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.into(),
            started,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Caller selection and window sizes for one status request.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusQuery {
    /// `None` selects every available key.
    pub include_keys: Option<Vec<String>>,
    pub exclude_keys: Vec<String>,
    pub request_interval: usize,
    pub time_interval: f64,
}

impl Default for StatusQuery {
    fn default() -> Self {
        Self {
            include_keys: None,
            exclude_keys: Vec::new(),
            request_interval: DEFAULT_REQUEST_INTERVAL,
            time_interval: DEFAULT_TIME_INTERVAL,
        }
    }
}

impl StatusQuery {
    /// `available ∩ include − exclude`. Unknown names are ignored.
    pub fn selected_keys(&self) -> BTreeSet<StatusKey> {
        let excluded: BTreeSet<StatusKey> = parse_keys(&self.exclude_keys).collect();
        let included: BTreeSet<StatusKey> = match &self.include_keys {
            Some(keys) => parse_keys(keys).collect(),
            None => StatusKey::ALL.into_iter().collect(),
        };
        included.difference(&excluded).copied().collect()
    }
}

fn parse_keys(keys: &[String]) -> impl Iterator<Item = StatusKey> + '_ {
    keys.iter().filter_map(|k| k.trim().parse().ok())
}

/// Flat status response; unselected keys are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_requests: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

pub struct StatusAggregator {
    info: Arc<ServiceInfo>,
    log: Arc<dyn QueryLog>,
}

impl StatusAggregator {
    pub fn new(info: Arc<ServiceInfo>, log: Arc<dyn QueryLog>) -> Self {
        Self { info, log }
    }

    /// Compute a fresh snapshot for `query`. Never cached.
    pub async fn status(&self, query: &StatusQuery) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::default();

        for key in query.selected_keys() {
            match key {
                StatusKey::Uptime => {
                    snapshot.uptime = Some(self.info.uptime().as_secs_f64());
                }
                StatusKey::NumRequests => {
                    let count = match self.log.request_count(query.time_interval).await {
                        Ok(count) => count,
                        Err(e) => {
                            tracing::warn!(error = %e, "num_requests unavailable");
                            0
                        }
                    };
                    snapshot.num_requests = Some(count);
                }
                StatusKey::AvgResponseTime => {
                    let avg = match self.log.avg_process_time(query.request_interval).await {
                        Ok(avg) => avg,
                        Err(e) => {
                            tracing::warn!(error = %e, "avg_response_time unavailable");
                            0.0
                        }
                    };
                    snapshot.avg_response_time = Some(avg);
                }
                StatusKey::ServiceName => {
                    snapshot.service_name = Some(self.info.name().to_string());
                }
            }
        }

        snapshot
    }
}
