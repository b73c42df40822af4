//! Error types for the rcgame crate

use std::path::PathBuf;

use thiserror::Error;

use crate::game::Move;

/// Main error type for the rcgame crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("illegal move {mv}: not claimable under the row/column restriction")]
    IllegalMove { mv: Move },

    #[error("search budget expired after {iterations} iterations ({elapsed_ms} ms) without a completed iteration")]
    SearchBudgetExhausted { iterations: u64, elapsed_ms: u128 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("board is empty")]
    EmptyBoard,

    #[error("non-numeric value '{value}' on line {line}")]
    NonNumericCell { line: usize, value: String },

    #[error("negative value {value} on line {line}")]
    NegativeCell { line: usize, value: i64 },

    #[error("row on line {line} has {got} values, expected {expected}")]
    RaggedRows {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("board is not square: {rows} rows of {cols} columns")]
    NotSquare { rows: usize, cols: usize },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }
}
