//! Word → valence lexicon.
//!
//! The lexicon is an immutable table loaded once before the service starts
//! and shared read-only afterwards (wrap it in an `Arc`). Keys are
//! lowercased on load; lookups lowercase the query, so callers may pass
//! tokens in their original casing.
//!
//! # File format
//!
//! The VADER tab-separated layout is accepted: one entry per line, the
//! token in the first column and its mean valence in the second. Any
//! further columns (standard deviation, raw ratings) are ignored. Blank
//! lines are skipped.
//!
//! ```text
//! good	1.9	0.9434	[2, 1, 1, 3, 2, 4, 2, 2, 1, 1]
//! :)	2.0	1.18322	[2, 2, 1, 1, 1, 1, 4, 3, 4, 1]
//! ```
//!
//! A curated subset ships with the crate as [`Lexicon::builtin`]. Point
//! `[lexicon].path` at a full VADER lexicon for production scoring.

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{bail, Context, Result};

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.tsv");

/// Immutable mapping from normalized word to valence.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, f64>,
}

impl Lexicon {
    /// The lexicon bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_LEXICON).context("bundled lexicon is malformed")
    }

    /// Parse a lexicon in the VADER tab-separated format.
    ///
    /// When two lines normalize to the same key the first one wins.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut columns = line.split('\t');
            let word = columns.next().unwrap_or_default().trim();
            let raw = columns.next().map(str::trim).unwrap_or_default();
            if word.is_empty() || raw.is_empty() {
                bail!("lexicon line {}: expected <word>\\t<valence>", index + 1);
            }
            let valence: f64 = raw.parse().with_context(|| {
                format!("lexicon line {}: invalid valence '{}'", index + 1, raw)
            })?;
            if !valence.is_finite() {
                bail!("lexicon line {}: valence must be finite", index + 1);
            }
            entries.entry(word.to_lowercase()).or_insert(valence);
        }

        Ok(Self { entries })
    }

    /// Build a lexicon from in-memory pairs. First occurrence wins.
    pub fn from_entries<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for (word, valence) in pairs {
            entries
                .entry(word.as_ref().to_lowercase())
                .or_insert(valence);
        }
        Self { entries }
    }

    /// Valence of `word`, or `None` when the word is not in the lexicon.
    pub fn get(&self, word: &str) -> Option<f64> {
        self.entries.get(normalize(word).as_ref()).copied()
    }

    /// Valence of `word`, defaulting to the neutral 0.0.
    pub fn valence(&self, word: &str) -> f64 {
        self.get(word).unwrap_or(0.0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(normalize(word).as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(word: &str) -> Cow<'_, str> {
    if word.chars().any(char::is_uppercase) {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.len() > 100);
        assert!(lexicon.valence("love") > 0.0);
        assert!(lexicon.valence("hate") < 0.0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = Lexicon::from_entries([("Good", 1.9)]);
        assert_eq!(lexicon.get("good"), Some(1.9));
        assert_eq!(lexicon.get("GOOD"), Some(1.9));
    }

    #[test]
    fn test_missing_word_is_neutral() {
        let lexicon = Lexicon::from_entries([("good", 1.9)]);
        assert_eq!(lexicon.get("table"), None);
        assert_eq!(lexicon.valence("table"), 0.0);
    }

    #[test]
    fn test_parse_vader_format_ignores_extra_columns() {
        let content = "good\t1.9\t0.9434\t[2, 1, 1, 3]\n\n:)\t2.0\t1.18\t[2, 2]\n";
        let lexicon = Lexicon::parse(content).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get(":)"), Some(2.0));
    }

    #[test]
    fn test_parse_first_duplicate_wins() {
        let lexicon = Lexicon::parse("Nice\t1.8\nnice\t-3.0\n").unwrap();
        assert_eq!(lexicon.len(), 1);
        assert_eq!(lexicon.get("nice"), Some(1.8));
    }

    #[test]
    fn test_parse_rejects_bad_valence() {
        let err = Lexicon::parse("good\tvery\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_rejects_missing_column() {
        assert!(Lexicon::parse("good\n").is_err());
    }
}
