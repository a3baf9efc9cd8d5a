//! Logical keys: the path-derived identity of a stylesheet.
//!
//! A logical key is the stylesheet's directory relative to `base`, joined
//! with its file name minus the extension, always using `/` as separator.
//! `src/nav/menu.css` under base `src` becomes `nav/menu`. The key namespaces
//! every local name declared by the file, and is also what `:from(...)`
//! references resolve to, so both sides must normalize identically.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    /// Key for the stylesheet at `path`.
    ///
    /// ```
    /// use cssnames_rename::LogicalKey;
    /// use std::path::Path;
    ///
    /// assert_eq!(LogicalKey::for_path(Path::new("a.css"), Path::new(".")).as_str(), "a");
    /// assert_eq!(LogicalKey::for_path(Path::new("src/c/c.css"), Path::new("src")).as_str(), "c/c");
    /// ```
    pub fn for_path(path: &Path, base: &Path) -> Self {
        let path = absolutize(path);
        let base = absolutize(base);
        let stem = match path.extension() {
            Some(_) => path.file_stem(),
            None => path.file_name(),
        };
        let directory = path.parent().map(|dir| relative_to(dir, &base)).unwrap_or_default();
        let segments = directory
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .chain(stem.map(|s| s.to_string_lossy().into_owned()));
        Self(segments.collect::<Vec<_>>().join("/"))
    }

    /// Key addressed by a `:from(reference)` clause inside `referrer`.
    ///
    /// References starting with `.` are resolved against the referring
    /// file's directory, anything else against `base`. Absolute references
    /// pass through untouched.
    ///
    /// ```
    /// use cssnames_rename::LogicalKey;
    /// use std::path::Path;
    ///
    /// let base = Path::new("src");
    /// let referrer = Path::new("src/c/c.css");
    /// assert_eq!(LogicalKey::for_reference("../a", referrer, base).as_str(), "a");
    /// assert_eq!(LogicalKey::for_reference("c/c.css", referrer, base).as_str(), "c/c");
    /// ```
    pub fn for_reference(reference: &str, referrer: &Path, base: &Path) -> Self {
        let anchor = match reference.starts_with('.') {
            true => referrer.parent().unwrap_or(Path::new(".")),
            false => base,
        };
        Self::for_path(&absolutize(anchor).join(reference), base)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<LogicalKey> for String {
    fn from(key: LogicalKey) -> Self {
        key.0
    }
}
impl From<&str> for LogicalKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Absolute, lexically normalized form of `path`.
///
/// Symlinks are deliberately not followed: keys must be computable for files
/// that only exist in the host's memory.
fn absolutize(path: &Path) -> PathBuf {
    let path = match path.as_os_str().is_empty() {
        true => Path::new("."),
        false => path,
    };
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // Popping past the root is a no-op, same as `cd /..`.
                normalized.pop();
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// `path` expressed relative to `base`; both must already be normalized.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();
    while let (Some(p), Some(b)) = (path_components.peek(), base_components.peek())
        && p == b
    {
        path_components.next();
        base_components.next();
    }
    base_components.map(|_| Component::ParentDir).chain(path_components).collect()
}
