//! In-memory storage backend for testing.

use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. On top of plain
/// storage it counts successful writes, can simulate slow writes, and can be
/// switched into a failing mode to exercise error propagation.
///
/// # Examples
///
/// ```
/// use cssnames_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("class-names.json", r#"{"a":{"box":"_4QF9"}}"#),
/// ]);
/// assert_eq!(backend.read(Path::new("class-names.json")).await?, br#"{"a":{"box":"_4QF9"}}"#);
///
/// backend.write(Path::new("class-names/b.json"), b"{}").await?;
/// assert_eq!(backend.writes(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
    writes: AtomicUsize,
    failing: AtomicBool,
    write_delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            write_delay: None,
        }
    }

    /// Make every write take `delay` (on the Tokio clock) before it lands.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Toggle write failures. While failing, writes return
    /// [`PermissionDenied`](ErrorKind::PermissionDenied) and are not counted.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of writes that have completed successfully.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current contents of a file as UTF-8, if it exists.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = validate_path(path.as_ref()).ok()?;
        let guard = self.storage.read().await;
        guard.get(&path).map(|data| String::from_utf8_lossy(data).into_owned())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let data = self.storage.read().await.get(&path).cloned();
        data.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        self.storage.write().await.insert(path, data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let backend = MockBackend::default();
        backend.write(Path::new("class-names.json"), b"{}").await.unwrap();
        assert_eq!(backend.read(Path::new("class-names.json")).await.unwrap(), b"{}");
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let backend = MockBackend::default();
        let err = backend.read(Path::new("class-names.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let backend = MockBackend::with_files([("class-names.json", "{}")]);
        backend.fail_writes(true);
        let err = backend.write(Path::new("class-names.json"), b"[]").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
        assert_eq!(backend.writes(), 0);
        assert_eq!(backend.contents("class-names.json").await.as_deref(), Some("{}"));

        backend.fail_writes(false);
        backend.write(Path::new("class-names.json"), b"[]").await.unwrap();
        assert_eq!(backend.contents("class-names.json").await.as_deref(), Some("[]"));
    }

    #[test]
    fn test_name() {
        assert_eq!(MockBackend::default().name(), "mock");
    }
}
