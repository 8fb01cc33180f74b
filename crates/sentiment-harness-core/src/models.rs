//! Core data models for Sentiment Harness.
//!
//! These types are the records that flow from the pipeline to the caller
//! and into the query log. Field names on the serialized forms are part of
//! the wire contract.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sentiment of one analyzed text unit.
///
/// `negative + neutral + positive` sums to 1.0 within floating tolerance.
/// `compound` is normalized separately into `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// The snippet exactly as it was analyzed.
    pub text: String,
    #[serde(rename = "neg")]
    pub negative: f64,
    #[serde(rename = "neu")]
    pub neutral: f64,
    #[serde(rename = "pos")]
    pub positive: f64,
    pub compound: f64,
}

impl SentimentRecord {
    /// The record for text with no sentiment-bearing content.
    pub fn neutral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            negative: 0.0,
            neutral: 1.0,
            positive: 0.0,
            compound: 0.0,
        }
    }
}

/// Which granularities a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granularity {
    pub word_level: bool,
    pub sentence_level: bool,
    pub paragraph_level: bool,
    pub document_level: bool,
}

impl Default for Granularity {
    fn default() -> Self {
        Self {
            word_level: true,
            sentence_level: true,
            paragraph_level: true,
            document_level: true,
        }
    }
}

/// Multi-granularity analysis of one document.
///
/// Levels that were not requested are omitted from the serialized form
/// entirely rather than emitted as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<SentimentRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<Vec<SentimentRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<SentimentRecord>,
    /// Milliseconds from the request-start marker to result assembly.
    #[serde(rename = "process_time")]
    pub process_time_ms: f64,
}

/// What the transport knew about an inbound request.
///
/// Serialized into the query log's `parameters` column after the configured
/// sensitive keys are stripped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub base_url: String,
    pub remote_addr: Option<String>,
    pub args: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

/// One row of the append-only query log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: i64,
    /// UTC insertion instant, millisecond precision or better.
    #[serde(with = "log_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Serialized [`RequestDescriptor`].
    pub parameters: String,
    /// Serialized [`AnalysisResult`].
    pub response: String,
    #[serde(rename = "process_time")]
    pub process_time_ms: f64,
}

/// Dump rows carry the same `YYYY-MM-DD HH:MM:SS.mmm` text the store holds.
mod log_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::store::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f").map_err(serde::de::Error::custom)
    }
}
