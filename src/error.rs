//! Transform Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every failure of a single transform
//! surfaces as one of these kinds; errors from the crates underneath are kept
//! as children of the tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A transform error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Option overrides could not be merged, or hold an unusable value.
    #[display("invalid options")]
    Options,
    /// The stylesheet could not be parsed. Positions are 1-based.
    #[display("{}: {reason} at {line}:{column}", path.display())]
    Syntax {
        path: PathBuf,
        reason: String,
        line: usize,
        column: usize,
    },
    /// The name mapping could not be persisted to the given target.
    #[display("could not persist name mapping: {}", _0.display())]
    Persist(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}
