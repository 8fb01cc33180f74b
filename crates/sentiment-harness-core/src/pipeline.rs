//! Multi-granularity analysis pipeline.
//!
//! Segments a document at each requested level and scores every unit with
//! the shared [`SentimentAnalyzer`]. Levels are computed independently of
//! one another; a level that was not requested is left as `None` so it is
//! omitted from the serialized result.
//!
//! | Level | Segmenter | Output |
//! |-------|-----------|--------|
//! | word | [`tokenize_words`] | one lexicon valence per distinct lowercase word |
//! | sentence | [`tokenize_sentences`] | one record per sentence occurrence |
//! | paragraph | [`tokenize_paragraphs`] | one record per paragraph occurrence |
//! | document | whole text | a single record |

use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::SentimentError;
use crate::models::{AnalysisResult, Granularity};
use crate::scorer::SentimentAnalyzer;
use crate::tokenize::{is_punctuation, tokenize_paragraphs, tokenize_sentences, tokenize_words};

/// Stateless orchestrator; share one instance across requests.
#[derive(Debug, Clone)]
pub struct SentimentPipeline {
    analyzer: SentimentAnalyzer,
}

impl SentimentPipeline {
    pub fn new(analyzer: SentimentAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Analyze `text`, timing from the moment of the call.
    pub fn analyze(
        &self,
        text: Option<&str>,
        flags: Granularity,
    ) -> Result<AnalysisResult, SentimentError> {
        self.analyze_since(text, flags, Instant::now())
    }

    /// Analyze `text`, timing from `started` (the request-start marker).
    ///
    /// Fails with [`SentimentError::Validation`] when `text` is absent or
    /// empty.
    pub fn analyze_since(
        &self,
        text: Option<&str>,
        flags: Granularity,
        started: Instant,
    ) -> Result<AnalysisResult, SentimentError> {
        let text = match text {
            None => {
                return Err(SentimentError::validation(
                    "You must pass the 'text' parameter",
                ))
            }
            Some("") => {
                return Err(SentimentError::validation(
                    "The 'text' parameter must not be empty",
                ))
            }
            Some(text) => text,
        };

        let words = flags.word_level.then(|| self.word_scores(text));

        let sentences = flags.sentence_level.then(|| {
            tokenize_sentences(text)
                .into_iter()
                .map(|s| self.analyzer.score(s))
                .collect()
        });

        let paragraphs = flags.paragraph_level.then(|| {
            tokenize_paragraphs(text)
                .into_iter()
                .map(|p| self.analyzer.score(p))
                .collect()
        });

        let document = flags.document_level.then(|| self.analyzer.score(text));

        Ok(AnalysisResult {
            words,
            sentences,
            paragraphs,
            document,
            process_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// One valence per distinct lowercase word of `text`.
    fn word_scores(&self, text: &str) -> BTreeMap<String, f64> {
        let lexicon = self.analyzer.lexicon();
        tokenize_words(text)
            .into_iter()
            .filter(|t| !is_punctuation(t) || lexicon.contains(t))
            .map(|t| {
                let word = t.to_lowercase();
                let valence = self.analyzer.word_valence(&word);
                (word, valence)
            })
            .collect()
    }
}
