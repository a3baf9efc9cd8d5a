//! Deterministic, collision-resistant renaming of CSS class and ID selectors.
//!
//! A build host hands every stylesheet to a [`Transformer`] as a [`File`].
//! Each `.name` or `#name` selector is replaced with a short identifier
//! derived from the file's logical key (its base-relative path without
//! extension) and the local name, so any other stylesheet can address the
//! same identifier with `.name:from("./that-file")` without shared state.
//! The names each file declares are collected in a process-wide cache and
//! persisted as JSON, debounced so that a whole build produces a single write
//! per target.
//!
//! ```no_run
//! use cssnames::{File, Transformer};
//! use cssnames_config::PartialOptions;
//! use cssnames_storage::backend::LocalBackend;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transformer = Transformer::new(Arc::new(LocalBackend::current_dir("local")?));
//! let file = File::new("a.css", ".box { color: red; }");
//! let output = transformer.transform(&file, &PartialOptions::default()).await?;
//! assert_eq!(output.buffer, b"._4QF9{color:red}");
//! transformer.finish().await;
//! # Ok(())
//! # }
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use cssnames_cache::NameCache;
use cssnames_config::{Layout, Options, PartialOptions};
use cssnames_rename::Renamed;
use cssnames_rename::error::ErrorKind as RenameErrorKind;
use cssnames_storage::BackendHandle;
use exn::ResultExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::instrument;

/// A stylesheet handed over by the build host.
///
/// `path` only feeds the logical key; the file is never read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub path: PathBuf,
    pub buffer: Vec<u8>,
}
impl File {
    pub fn new(path: impl Into<PathBuf>, buffer: impl Into<Vec<u8>>) -> Self {
        Self { path: path.into(), buffer: buffer.into() }
    }
}

/// Result of transforming one [`File`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub buffer: Vec<u8>,
    /// Side files the host should track as build dependencies of this
    /// stylesheet. Only populated for the per-file layout.
    pub links: Vec<PathBuf>,
}

/// Entry point for one build run.
///
/// Owns the [`NameCache`] shared by every transformed file; clones share it
/// too. Call [`finish`](Self::finish) once the build is done so that detached
/// saves are not lost.
#[derive(Clone)]
pub struct Transformer {
    cache: NameCache,
}

/// A rewritten file whose names are recorded but not yet persisted.
struct Prepared {
    output: Output,
    target: PathBuf,
    debounce: Duration,
}

impl Transformer {
    pub fn new(backend: BackendHandle) -> Self {
        Self { cache: NameCache::new(backend) }
    }

    pub fn cache(&self) -> &NameCache {
        &self.cache
    }

    /// Renames the selectors of `file` and waits until its names are
    /// persisted (or found to be up to date already).
    ///
    /// # Errors
    /// - [`ErrorKind::Options`] if `overrides` are unusable.
    /// - [`ErrorKind::Syntax`] if the stylesheet cannot be parsed.
    /// - [`ErrorKind::Persist`] if the persistence cycle covering this file
    ///   failed. The names stay cached, so a later save may still succeed.
    ///
    /// No output is returned alongside an error.
    #[instrument(skip_all, fields(path = %file.path.display()))]
    pub async fn transform(&self, file: &File, overrides: &PartialOptions) -> Result<Output> {
        let Prepared { output, target, debounce } = self.prepare(file, overrides)?;
        self.cache.save(&target, debounce).wait().await.or_raise(|| ErrorKind::Persist(target.clone()))?;
        Ok(output)
    }

    /// Like [`transform`](Self::transform), but returns as soon as the save
    /// is scheduled. Persistence failures are only logged.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip_all, fields(path = %file.path.display()))]
    pub fn transform_detached(&self, file: &File, overrides: &PartialOptions) -> Result<Output> {
        let Prepared { output, target, debounce } = self.prepare(file, overrides)?;
        self.cache.schedule(&target, debounce);
        Ok(output)
    }

    /// Waits for every pending save.
    pub async fn finish(&self) {
        self.cache.flush().await;
    }

    fn prepare(&self, file: &File, overrides: &PartialOptions) -> Result<Prepared> {
        let options = Options::merged(overrides).or_raise(|| ErrorKind::Options)?;
        let source = String::from_utf8_lossy(&file.buffer);
        let Renamed { css, names, key } = match cssnames_rename::rename(&source, &file.path, &options) {
            Ok(renamed) => renamed,
            Err(err) => {
                let RenameErrorKind::Syntax { reason, line, column } = (*err).clone();
                return Err(err.raise(ErrorKind::Syntax { path: file.path.clone(), reason, line, column }));
            },
        };

        let target = options.mapping_target(key.as_str());
        let links = match options.layout {
            Layout::Shared => {
                self.cache.record(&target, &key, names);
                Vec::new()
            },
            Layout::PerFile => {
                self.cache.record_file(&target, names);
                vec![target.clone()]
            },
        };
        tracing::debug!(key = %key, mapping = %target.display(), "Recorded names");
        Ok(Prepared { output: Output { buffer: css.into_bytes(), links }, target, debounce: options.debounce_interval() })
    }
}
