// Error types for the email checker

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("unexpected extra argument: {0}")]
    UnexpectedArgument(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("missing input file argument")]
    MissingFile,

    #[error("rate-limit must be an integer, got {0:?}")]
    InvalidRateLimit(String),

    #[error("rate-limit cannot be negative (got {0})")]
    NegativeRateLimit(i64),
}

/// A batch run was interrupted before every address was classified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("interrupted by user after {completed} of {total} addresses")]
pub struct Cancelled {
    pub completed: usize,
    pub total: usize,
}
