//! Rename Error Types

use derive_more::{Display, Error};

/// A renaming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for renaming operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stylesheet could not be scanned into rules. Positions are 1-based.
    #[display("{reason} at {line}:{column}")]
    Syntax {
        reason: String,
        line: usize,
        column: usize,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // Same input, same parse.
            Self::Syntax { .. } => false,
        }
    }
}
