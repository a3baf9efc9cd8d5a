//! Process-wide name cache for one build run.
//!
//! Every transformed stylesheet records its [`NameMapping`] into a
//! [`NameCache`], keyed by the persisted target file it belongs to. Saving is
//! debounced per target: bursts of updates from files processed concurrently
//! collapse into a single read-merge-write cycle, and only one such cycle is
//! ever in flight for a given target.
//!
//! # Architecture
//! - [`NameStore`]: the in-memory documents, one per target, with merge and
//!   deterministic (sorted, compact) JSON rendering.
//! - [`NameCache`]: a cloneable handle sharing the store with the debounced
//!   persister that drives a [`StorageBackend`](cssnames_storage::StorageBackend).
//!
//! [`NameMapping`]: cssnames_rename::NameMapping

pub mod error;
mod persist;
mod store;

pub use crate::persist::{NameCache, Settlement};
pub use crate::store::NameStore;
