//! # Sentiment Harness Core
//!
//! Shared, runtime-agnostic logic for Sentiment Harness: data models, the
//! valence lexicon, tokenizers, the lexicon + heuristics scorer, the
//! multi-granularity pipeline, the query log store abstraction, and the
//! status aggregator.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Storage backends and transports live in the `sentiment-harness` crate.

pub mod error;
pub mod filter;
pub mod lexicon;
pub mod models;
pub mod pipeline;
pub mod scorer;
pub mod status;
pub mod store;
pub mod tokenize;
