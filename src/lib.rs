//! # Sentiment Harness
//!
//! A multi-granularity sentiment analysis service with a persistent query
//! log and status introspection.
//!
//! Text submitted to the service is scored with a lexicon and rule based
//! (VADER-style) analyzer at word, sentence, paragraph, and document
//! level. Every analysis is appended to a SQLite query log, which backs
//! the `/admin/status` aggregates and the `/admin/table` dump.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌───────────┐
//! │  HTTP / CLI  │──▶│   Pipeline    │──▶│  Recorder │
//! │ (axum/clap)  │   │ words..doc    │   │ redaction │
//! └──────────────┘   └───────────────┘   └─────┬─────┘
//!                                              ▼
//!                    ┌───────────────┐   ┌───────────┐
//!                    │    Status     │◀──│  SQLite   │
//!                    │  aggregator   │   │  queries  │
//!                    └───────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! senti init                               # create database
//! senti analyze "I love this! I hate that."
//! senti serve                              # start HTTP server
//! senti status --request-interval 10
//! senti dump queries
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_log`] | SQLite query log backend |
//! | [`analyze`] | Pipeline construction and query recording |
//! | [`admin`] | `status` and `dump` commands |
//! | [`server`] | HTTP server |
//! | [`logging`] | Log subscriber setup |
//!
//! Scoring, tokenization, and the status aggregator live in the
//! `sentiment-harness-core` crate.

pub mod admin;
pub mod analyze;
pub mod config;
pub mod db;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_log;
