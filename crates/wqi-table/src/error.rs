use thiserror::Error;
use wqi_core::ScoreError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("csv input has no header row")]
    Empty,

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: quoted field is never closed")]
    UnterminatedQuote { line: usize },

    #[error("{rows} rows but {results} results")]
    LengthMismatch { rows: usize, results: usize },

    #[error("batch has {expected} samples but {found} {field}")]
    InconsistentRows {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Score(#[from] ScoreError),
}
