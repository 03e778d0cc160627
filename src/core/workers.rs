//! # Background workers spawned by modules.
//!
//! Modules start their steady-state work from `launch` through
//! [`ModuleContext::spawn_worker`](crate::ModuleContext::spawn_worker). Every
//! worker is a tokio task tracked here so `shutdown_all` can wait for it.
//!
//! ## Architecture
//! ```text
//! spawn_worker("gateway/heartbeat", fut)
//!   └─► TaskTracker::spawn(async { let _alive = AliveGuard; fut.await })
//!                                   │
//!             alive: { id → "gateway/heartbeat" }   (removed when the guard drops,
//!                                                    also on panic or abort)
//!
//! wait_with_grace(grace)
//!   ├─► tracker.close()
//!   ├─► timeout(grace, tracker.wait())
//!   │     ├─ Ok      → []
//!   │     └─ Elapsed → snapshot() (sorted names still alive)
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Tracks the workers of every module.
#[derive(Default)]
pub(crate) struct Workers {
    tracker: TaskTracker,
    alive: Mutex<HashMap<u64, String>>,
    next_id: AtomicU64,
}

impl Workers {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Spawns `fut` as a tracked worker named `label`.
    pub(crate) fn spawn<F>(self: &Arc<Self>, label: String, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, label.clone());
        debug!(worker = %label, "worker spawned");

        let guard = AliveGuard {
            workers: Arc::clone(self),
            id,
        };
        self.tracker.spawn(async move {
            let _guard = guard;
            fut.await;
        });
    }

    /// Sorted names of the workers still running.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().values().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Refuses new workers and waits up to `grace` for the running ones.
    ///
    /// Returns the workers that did not finish in time.
    pub(crate) async fn wait_with_grace(&self, grace: Duration) -> Vec<String> {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return Vec::new();
        }
        let stuck = self.snapshot();
        warn!(?grace, stuck = ?stuck, "workers still running after grace period");
        stuck
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, String>> {
        // A poisoned map is still a valid map of names.
        self.alive.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct AliveGuard {
    workers: Arc<Workers>,
    id: u64,
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        if let Some(label) = self.workers.lock().remove(&self.id) {
            debug!(worker = %label, "worker finished");
        }
    }
}
