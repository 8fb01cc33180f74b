//! Pipeline construction, query recording, and the `senti analyze` command.
//!
//! The lexicon is loaded once here, before any request is accepted, and
//! shared read-only through the [`SentimentPipeline`].
//!
//! Recording is best-effort but loud: a failed append is reported through
//! `tracing::error!` and the caller still receives its analysis.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use sentiment_harness_core::filter::KeyFilter;
use sentiment_harness_core::lexicon::Lexicon;
use sentiment_harness_core::models::{AnalysisResult, Granularity, RequestDescriptor};
use sentiment_harness_core::pipeline::SentimentPipeline;
use sentiment_harness_core::scorer::SentimentAnalyzer;
use sentiment_harness_core::store::QueryLog;

use crate::config::Config;

/// Load the configured lexicon, or the bundled one when no path is set.
pub fn load_lexicon(config: &Config) -> Result<Lexicon> {
    match &config.lexicon.path {
        Some(path) => load_lexicon_file(path),
        None => Lexicon::builtin(),
    }
}

fn load_lexicon_file(path: &Path) -> Result<Lexicon> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lexicon: {}", path.display()))?;
    let lexicon = Lexicon::parse(&content)
        .with_context(|| format!("Failed to parse lexicon: {}", path.display()))?;
    if lexicon.is_empty() {
        anyhow::bail!("Lexicon {} has no entries", path.display());
    }
    Ok(lexicon)
}

/// Build the shared pipeline from configuration.
pub fn build_pipeline(config: &Config) -> Result<SentimentPipeline> {
    let lexicon = load_lexicon(config)?;
    tracing::info!(entries = lexicon.len(), "lexicon loaded");
    let analyzer = SentimentAnalyzer::new(Arc::new(lexicon)).with_alpha(config.scoring.alpha);
    Ok(SentimentPipeline::new(analyzer))
}

/// Writes analysis requests and responses to the query log.
pub struct QueryRecorder {
    log: Arc<dyn QueryLog>,
    filter: KeyFilter,
}

impl QueryRecorder {
    pub fn new(log: Arc<dyn QueryLog>, filter: KeyFilter) -> Self {
        Self { log, filter }
    }

    pub fn from_config(config: &Config, log: Arc<dyn QueryLog>) -> Self {
        Self::new(log, KeyFilter::new(&config.query_log.redact_keys))
    }

    /// Append one entry. Returns the new `query_id`, or `None` if logging
    /// failed (already reported).
    pub async fn record(
        &self,
        request: &RequestDescriptor,
        result: &AnalysisResult,
    ) -> Option<i64> {
        let (parameters, response) = match (self.serialize(request), self.serialize(result)) {
            (Ok(parameters), Ok(response)) => (parameters, response),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "failed to serialize query log entry");
                return None;
            }
        };

        match self
            .log
            .append(&parameters, &response, result.process_time_ms)
            .await
        {
            Ok(query_id) => {
                tracing::debug!(query_id, process_time_ms = result.process_time_ms, "query recorded");
                Some(query_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to record query");
                None
            }
        }
    }

    fn serialize<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let value = serde_json::to_value(value)?;
        Ok(serde_json::to_string(&self.filter.strip(&value))?)
    }
}

/// Run `senti analyze`: score text and print the result as JSON.
///
/// The result is not written to the query log.
pub fn run_analyze(config: &Config, text: &str, flags: Granularity) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let result = pipeline.analyze(Some(text), flags)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
