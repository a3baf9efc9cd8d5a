//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the seam between the name
//! cache persister and the filesystem it writes mapping documents to.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for storage backends.
///
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use cssnames_storage::{backend::StorageBackend, error::Result};
///
/// use cssnames_storage::error::ErrorKind;
///
/// async fn current_mapping(backend: &dyn StorageBackend) -> Result<Option<Vec<u8>>> {
///     match backend.read(Path::new("class-names.json")).await {
///         Ok(data) => Ok(Some(data)),
///         Err(err) if matches!(&*err, ErrorKind::NotFound(_)) => Ok(None),
///         Err(err) => Err(err),
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist; callers that treat a missing file as empty should
    /// match on that kind.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided data.
    ///
    /// # Notes
    /// - Implementations must create parent directories as needed
    ///   (recursive and idempotent).
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
