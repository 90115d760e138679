//! Error types for myorm-check

use thiserror::Error;

/// Result type for myorm-check operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Error type for myorm-check operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The query was blank after normalization.
    #[error("invalid or empty query")]
    Empty,
    /// The tokenizer rejected the text, e.g. an unterminated literal.
    #[error("SQL tokenize error: {0}")]
    Tokenize(String),
    /// More than one statement was supplied.
    #[error("expected a single statement, got {0}")]
    MultipleStatements(usize),
    /// The SQL parser rejected the statement.
    #[error("SQL syntax error: {0}")]
    Parse(String),
}
