//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/senti.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//!
//! [service]
//! name = "vader-sentiment"
//!
//! [lexicon]
//! path = "./data/vader_lexicon.txt"   # optional, built-in lexicon otherwise
//!
//! [scoring]
//! alpha = 15.0
//!
//! [status]
//! request_interval = 100
//! time_interval = 60
//!
//! [query_log]
//! redact_keys = ["cookie", "authorization"]
//!
//! [log]
//! level = "info"
//! ```
//!
//! Only `[db]` and `[server]` are required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sentiment_harness_core::scorer::SentimentAnalyzer;
use sentiment_harness_core::status::{DEFAULT_REQUEST_INTERVAL, DEFAULT_TIME_INTERVAL};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub query_log: QueryLogConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
        }
    }
}

fn default_service_name() -> String {
    "vader-sentiment".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LexiconConfig {
    /// VADER-format lexicon file. The bundled lexicon is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

fn default_alpha() -> f64 {
    SentimentAnalyzer::DEFAULT_ALPHA
}

/// Defaults for status requests that omit their window parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    #[serde(default = "default_request_interval")]
    pub request_interval: usize,
    #[serde(default = "default_time_interval")]
    pub time_interval: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            request_interval: default_request_interval(),
            time_interval: default_time_interval(),
        }
    }
}

fn default_request_interval() -> usize {
    DEFAULT_REQUEST_INTERVAL
}
fn default_time_interval() -> f64 {
    DEFAULT_TIME_INTERVAL
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryLogConfig {
    /// Keys stripped (case-insensitively, at any depth) before logging.
    #[serde(default = "default_redact_keys")]
    pub redact_keys: Vec<String>,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            redact_keys: default_redact_keys(),
        }
    }
}

fn default_redact_keys() -> Vec<String> {
    vec!["cookie".to_string(), "authorization".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }

        if self.service.name.trim().is_empty() {
            anyhow::bail!("service.name must not be empty");
        }

        if !(self.scoring.alpha.is_finite() && self.scoring.alpha > 0.0) {
            anyhow::bail!("scoring.alpha must be a positive number");
        }

        if self.status.request_interval == 0 {
            anyhow::bail!("status.request_interval must be >= 1");
        }

        if !(self.status.time_interval.is_finite() && self.status.time_interval >= 0.0) {
            anyhow::bail!("status.time_interval must be >= 0");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    Config::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[db]
path = "./data/senti.sqlite"

[server]
bind = "127.0.0.1:5000"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let cfg = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(cfg.service.name, "vader-sentiment");
        assert_eq!(cfg.status.request_interval, 100);
        assert_eq!(cfg.status.time_interval, 60.0);
        assert_eq!(cfg.scoring.alpha, 15.0);
        assert!(cfg.lexicon.path.is_none());
        assert_eq!(cfg.query_log.redact_keys, vec!["cookie", "authorization"]);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let content = format!("{}\n[scoring]\nalpha = 0.0\n", MINIMAL);
        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_rejects_zero_request_interval() {
        let content = format!("{}\n[status]\nrequest_interval = 0\n", MINIMAL);
        assert!(Config::from_toml(&content).is_err());
    }

    #[test]
    fn test_missing_db_section_fails() {
        assert!(Config::from_toml("[server]\nbind = \"127.0.0.1:1\"\n").is_err());
    }
}
