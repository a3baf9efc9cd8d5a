//! Debounced persistence of name mappings.
//!
//! Each target moves through `Idle -> Pending -> Syncing -> Idle`. The first
//! save request for an idle target arms a timer; requests arriving while the
//! timer is armed join the same pending cycle and do not re-arm it. When the
//! timer fires the cycle takes the target's cycle lock, claims every waiter
//! queued so far, then reads, merges, and writes only if the rendered
//! document differs from what is on disk. Waiters that arrive after a cycle
//! has claimed its batch arm the next cycle, which queues behind the cycle
//! lock, so at most one read-modify-write is in flight per target.

use crate::error::{ErrorKind, Result};
use crate::store::NameStore;
use cssnames_rename::{LogicalKey, NameMapping};
use cssnames_storage::BackendHandle;
use cssnames_storage::error::ErrorKind as StorageErrorKind;
use exn::ResultExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

type Outcome = std::result::Result<(), ErrorKind>;

/// Shared name cache and persister for one build run.
///
/// Cheap to clone; all clones share the same store and queues.
#[derive(Clone)]
pub struct NameCache {
    inner: Arc<Inner>,
}

struct Inner {
    backend: BackendHandle,
    store: Mutex<NameStore>,
    queues: Mutex<HashMap<PathBuf, Arc<Queue>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Default)]
struct Queue {
    pending: Mutex<Pending>,
    /// Held for the whole read-merge-write of a cycle.
    cycle: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct Pending {
    waiters: Vec<oneshot::Sender<Outcome>>,
    armed: bool,
}

/// Outcome of the persistence cycle that covers one save request.
///
/// The request is queued as soon as [`NameCache::save`] returns; awaiting
/// [`wait`](Self::wait) only observes the result. Dropping it detaches the
/// request without cancelling the cycle.
#[must_use = "dropping a settlement detaches the save; use `NameCache::schedule` for that"]
pub struct Settlement {
    target: PathBuf,
    receiver: oneshot::Receiver<Outcome>,
}

impl Settlement {
    /// Waits until the cycle has written the target, or decided it was
    /// already up to date.
    ///
    /// # Errors
    /// The cycle's [`ErrorKind`], shared with every other request of that
    /// cycle, or [`ErrorKind::Abandoned`] if the cycle never reported back.
    pub async fn wait(self) -> Result<()> {
        match self.receiver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(kind)) => Err(exn::Exn::from(kind)),
            Err(_) => exn::bail!(ErrorKind::Abandoned(self.target)),
        }
    }
}

impl NameCache {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store: Mutex::new(NameStore::new()),
                queues: Mutex::new(HashMap::new()),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Records a stylesheet's names into the shared document at `target`.
    pub fn record(&self, target: &Path, key: &LogicalKey, names: NameMapping) {
        lock(&self.inner.store).record(target, key, names);
    }

    /// Records a stylesheet's names as the whole document at `target`.
    pub fn record_file(&self, target: &Path, names: NameMapping) {
        lock(&self.inner.store).record_file(target, names);
    }

    /// Requests that `target` be persisted, coalescing with any save already
    /// pending for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn save(&self, target: &Path, debounce: Duration) -> Settlement {
        let (sender, receiver) = oneshot::channel();
        let queue = self.queue(target);
        let mut pending = lock(&queue.pending);
        pending.waiters.push(sender);
        if pending.armed {
            debug!(path = %target.display(), waiters = pending.waiters.len(), "Joined pending save");
        } else {
            pending.armed = true;
            let cache = self.clone();
            let cycle_target = target.to_path_buf();
            let cycle_queue = Arc::clone(&queue);
            let handle = tokio::spawn(async move { cache.cycle(cycle_target, cycle_queue, debounce).await });
            let mut tasks = lock(&self.inner.tasks);
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle);
        }
        Settlement { target: target.to_path_buf(), receiver }
    }

    /// Like [`save`](Self::save), without waiting for the outcome. Failures
    /// are still logged by the cycle.
    pub fn schedule(&self, target: &Path, debounce: Duration) {
        drop(self.save(target, debounce));
    }

    /// Waits for every cycle scheduled so far, including cycles armed while
    /// flushing.
    pub async fn flush(&self) {
        loop {
            let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Persistence task did not complete");
                }
            }
        }
    }

    fn queue(&self, target: &Path) -> Arc<Queue> {
        let mut queues = lock(&self.inner.queues);
        Arc::clone(queues.entry(target.to_path_buf()).or_default())
    }

    async fn cycle(self, target: PathBuf, queue: Arc<Queue>, debounce: Duration) {
        tokio::time::sleep(debounce).await;
        let _cycle = queue.cycle.lock().await;
        let waiters = {
            let mut pending = lock(&queue.pending);
            pending.armed = false;
            std::mem::take(&mut pending.waiters)
        };
        let outcome = self.sync(&target).await.map_err(|e| {
            warn!(path = %target.display(), waiters = waiters.len(), error = ?e, "Failed to persist name mapping");
            (*e).clone()
        });
        for waiter in waiters {
            // Detached requests have dropped their receiver.
            _ = waiter.send(outcome.clone());
        }
    }

    #[instrument(skip(self), fields(backend = %self.inner.backend.name(), path = %target.display()))]
    async fn sync(&self, target: &Path) -> Result<()> {
        let persisted = match self.inner.backend.read(target).await {
            Ok(bytes) => Some(bytes),
            Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => None,
            Err(e) => return Err(e).or_raise(|| ErrorKind::Read(target.to_path_buf())),
        };
        let rendered = {
            let mut store = lock(&self.inner.store);
            if let Some(persisted) = &persisted {
                store.merge_from_disk(target, persisted)?;
            }
            store.render(target)?
        };
        if persisted.as_deref() == Some(rendered.as_bytes()) {
            debug!("Name mapping unchanged, skipping write");
            return Ok(());
        }
        self.inner
            .backend
            .write(target, rendered.as_bytes())
            .await
            .or_raise(|| ErrorKind::Write(target.to_path_buf()))?;
        debug!(bytes = rendered.len(), "Wrote name mapping");
        Ok(())
    }
}

/// A poisoned lock only means another request panicked mid-update; the maps
/// themselves are always left consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
