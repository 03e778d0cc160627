//! # Per-module handle passed to every hook.
//!
//! [`ModuleContext`] is how a module reaches the rest of the process:
//! - [`bus`](ModuleContext::bus) to dispatch events to its peers;
//! - [`token`](ModuleContext::token), a child of the orchestrator's runtime
//!   token, cancelled by `shutdown_all` after every shutdown hook has run;
//! - [`spawn_worker`](ModuleContext::spawn_worker) for background loops the
//!   orchestrator waits for (within `grace`) during shutdown;
//! - [`request_shutdown`](ModuleContext::request_shutdown) to end
//!   [`Orchestrator::run_until_signal`](crate::Orchestrator::run_until_signal)
//!   from inside the process (a console `quit` command, a fatal remote error).

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::workers::Workers;
use crate::events::EventBus;
use crate::modules::ModuleKind;

#[derive(Clone)]
pub struct ModuleContext {
    bus: Arc<EventBus>,
    name: &'static str,
    kind: ModuleKind,
    id: Uuid,
    token: CancellationToken,
    shutdown: CancellationToken,
    workers: Arc<Workers>,
}

impl ModuleContext {
    pub(crate) fn new(
        bus: Arc<EventBus>,
        name: &'static str,
        kind: ModuleKind,
        id: Uuid,
        runtime: &CancellationToken,
        shutdown: CancellationToken,
        workers: Arc<Workers>,
    ) -> Self {
        Self {
            bus,
            name,
            kind,
            id,
            token: runtime.child_token(),
            shutdown,
            workers,
        }
    }

    #[inline]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cancelled once the module set is shutting down.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawns a tracked background worker named `<module>/<label>`.
    ///
    /// `f` receives a clone of this module's token; the worker should return
    /// once it is cancelled.
    pub fn spawn_worker<F, Fut>(&self, label: &str, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fut = f(self.token.clone());
        self.workers.spawn(format!("{}/{label}", self.name), fut);
    }

    /// Asks the process to shut down.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// True once [`request_shutdown`](Self::request_shutdown) was called by any module.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(runtime: &CancellationToken, workers: Arc<Workers>) -> ModuleContext {
        ModuleContext::new(
            Arc::new(EventBus::with_lifecycle()),
            "gateway",
            ModuleKind::GATEWAY,
            Uuid::new_v4(),
            runtime,
            CancellationToken::new(),
            workers,
        )
    }

    #[tokio::test]
    async fn test_worker_stops_when_runtime_is_cancelled() {
        let runtime = CancellationToken::new();
        let workers = Workers::new();
        let ctx = ctx(&runtime, workers.clone());

        ctx.spawn_worker("heartbeat", |token| async move { token.cancelled().await });
        assert_eq!(workers.snapshot(), vec!["gateway/heartbeat".to_string()]);

        runtime.cancel();
        assert!(ctx.token().is_cancelled());
        assert!(workers.wait_with_grace(Duration::from_secs(1)).await.is_empty());
    }

    #[test]
    fn test_shutdown_request_is_shared_between_clones() {
        let ctx = ctx(&CancellationToken::new(), Workers::new());
        let other = ctx.clone();
        assert!(!other.shutdown_requested());
        ctx.request_shutdown();
        assert!(other.shutdown_requested());
        assert!(!ctx.token().is_cancelled());
    }
}
