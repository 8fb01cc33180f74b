//! # Sentiment Harness CLI (`senti`)
//!
//! ## Usage
//!
//! ```bash
//! senti --config ./config/senti.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `senti init` | Create the SQLite database and run schema migrations |
//! | `senti serve` | Start the HTTP server |
//! | `senti analyze [TEXT]` | Score text locally and print the result |
//! | `senti status` | Print status aggregates from the query log |
//! | `senti dump <table>` | Print every row of a whitelisted table |
//!
//! ## Examples
//!
//! ```bash
//! # Score a sentence without touching the database
//! senti analyze "The food was great, but the service was awful."
//!
//! # Document-level score for a file
//! senti analyze --file review.txt --no-words --no-sentences --no-paragraphs
//!
//! # Average over the last 10 requests, count over the last 5 minutes
//! senti status --request-interval 10 --time-interval 300
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sentiment_harness::{admin, analyze, config, logging, migrate, server};
use sentiment_harness_core::models::Granularity;
use sentiment_harness_core::status::StatusQuery;

#[derive(Parser)]
#[command(
    name = "senti",
    about = "Sentiment Harness: multi-granularity sentiment analysis with a query log",
    version,
    long_about = "Sentiment Harness scores text at word, sentence, paragraph, and document \
    level with a lexicon and rule based analyzer, logs every request, and reports \
    uptime, request volume, and response time over HTTP or the command line."
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "./config/senti.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    Init,

    /// Start the HTTP server.
    Serve,

    /// Analyze text and print the result as JSON.
    ///
    /// Reads from TEXT, then --file, then stdin. Nothing is logged.
    Analyze {
        text: Option<String>,

        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Omit word-level scores.
        #[arg(long)]
        no_words: bool,

        /// Omit sentence-level scores.
        #[arg(long)]
        no_sentences: bool,

        /// Omit paragraph-level scores.
        #[arg(long)]
        no_paragraphs: bool,

        /// Omit the document-level score.
        #[arg(long)]
        no_document: bool,
    },

    /// Print status aggregates from the query log.
    Status {
        /// Only report these keys (comma-separated).
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Never report these keys (comma-separated).
        #[arg(long, value_delimiter = ',', default_value = "uptime")]
        exclude: Vec<String>,

        /// Number of most recent requests averaged for avg_response_time.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        request_interval: Option<u64>,

        /// Window in seconds counted for num_requests.
        #[arg(long)]
        time_interval: Option<f64>,
    },

    /// Dump a table from the database.
    Dump { table: String },
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read text from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.log.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Analyze {
            text,
            file,
            no_words,
            no_sentences,
            no_paragraphs,
            no_document,
        } => {
            let input = read_input(text, file)?;
            let flags = Granularity {
                word_level: !no_words,
                sentence_level: !no_sentences,
                paragraph_level: !no_paragraphs,
                document_level: !no_document,
            };
            analyze::run_analyze(&cfg, &input, flags)?;
        }
        Commands::Status {
            include,
            exclude,
            request_interval,
            time_interval,
        } => {
            let time_interval = time_interval.unwrap_or(cfg.status.time_interval);
            if !(time_interval.is_finite() && time_interval >= 0.0) {
                anyhow::bail!("--time-interval must be >= 0");
            }
            let request_interval = match request_interval {
                Some(n) => usize::try_from(n).context("--request-interval is too large")?,
                None => cfg.status.request_interval,
            };
            let query = StatusQuery {
                include_keys: include,
                exclude_keys: exclude,
                request_interval,
                time_interval,
            };
            admin::run_status(&cfg, &query).await?;
        }
        Commands::Dump { table } => {
            admin::run_dump(&cfg, &table).await?;
        }
    }

    Ok(())
}
