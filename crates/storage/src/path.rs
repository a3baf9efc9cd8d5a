//! Target path validation.
//!
//! Mapping targets are always addressed relative to a backend root. A target
//! that would land outside of that root (`../elsewhere.json`) is rejected
//! rather than silently rewritten.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a target path relative to the storage root.
///
/// Leading `/` and `.` components are dropped, `..` is resolved lexically and
/// must never climb above the root. Null bytes are rejected, as is any path
/// that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use cssnames_storage::validate_path;
/// assert_eq!(validate_path("class-names.json").unwrap(), Path::new("class-names.json"));
/// assert_eq!(validate_path("./build//names/../class-names.json").unwrap(), Path::new("build/class-names.json"));
/// assert!(validate_path("../class-names.json").is_err());
/// assert!(validate_path("").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || exn::Exn::from(ErrorKind::InvalidPath(original.to_path_buf()));
    let mut normalized: Vec<_> = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => return Err(invalid()),
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => return Err(invalid()),
            Component::ParentDir => {
                normalized.pop().ok_or_else(invalid)?;
            },
        }
    }
    if normalized.is_empty() {
        return Err(invalid());
    }
    Ok(normalized.into_iter().collect())
}
