//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Kinds are `Clone` because the outcome of one persistence cycle is handed to
/// every caller waiting on it.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The persisted mapping exists but could not be read.
    #[display("could not read name mapping: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The merged mapping could not be written (or its directory created).
    #[display("could not write name mapping: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// The persisted mapping is not a JSON object of name mappings. It is
    /// left untouched; fix or delete it by hand.
    #[display("invalid name mapping: {}", _0.display())]
    InvalidData(#[error(not(source))] PathBuf),
    /// Serialization error.
    #[display("could not serialize name mapping")]
    Serialize,
    /// The persistence cycle went away before reporting an outcome (runtime
    /// shutdown or a panicking task).
    #[display("persistence abandoned: {}", _0.display())]
    Abandoned(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_) | Self::Abandoned(_))
    }
}
