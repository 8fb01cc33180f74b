//! Caller-visible error taxonomy.
//!
//! Internal failures (I/O, SQL, serialization) travel as `anyhow::Error`.
//! The variants here are the ones a transport must be able to recognize and
//! surface with a stable numeric code, so they are typed and can be
//! recovered from an `anyhow::Error` with `downcast_ref`.

use thiserror::Error;

/// Numeric code reported when a required input is missing or empty.
pub const VALIDATION_ERROR_CODE: u32 = 1412;

/// Numeric code reported when a debug dump names an unknown table.
pub const NOT_FOUND_ERROR_CODE: u32 = 1404;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SentimentError {
    /// A required caller input was absent or empty.
    #[error("{message}")]
    Validation { message: String },

    /// The debug dump was asked for a table outside the whitelist.
    #[error("no dumpable table named '{0}'")]
    TableNotFound(String),
}

impl SentimentError {
    pub fn validation(message: impl Into<String>) -> Self {
        SentimentError::Validation {
            message: message.into(),
        }
    }

    /// Stable numeric code for the error body.
    pub fn code(&self) -> u32 {
        match self {
            SentimentError::Validation { .. } => VALIDATION_ERROR_CODE,
            SentimentError::TableNotFound(_) => NOT_FOUND_ERROR_CODE,
        }
    }
}
