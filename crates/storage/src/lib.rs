//! Filesystem primitives used to persist name mappings.
//!
//! The persistence layer only ever needs to read a whole file, write a whole
//! file (creating parent directories on the way), and check for existence.
//! Those operations sit behind [`StorageBackend`] so that the debounced
//! persister can be driven against the local filesystem in production and an
//! in-memory backend in tests.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
