//! # Event bus: listener set + synchronous, isolated delivery.
//!
//! [`EventBus`] holds the set of registered [`EventListener`]s, builds events
//! from `(key, args)` through its [`EventRegistry`], and delivers them to the
//! listeners **on the dispatching task**.
//!
//! ## Architecture
//! ```text
//! Producers (modules, orchestrator, anyone with Arc<EventBus>):
//!
//!   dispatch(key, args) ──► registry.construct(key, args) ──┐   (read lock held)
//!   emit(event) ────────────────────────────────────────────┤
//!                                                           ▼
//!                                       for each listener (optionally filtered):
//!                                           guarded(on_event(&event, priority))
//!                                             ├─ Ok        → delivered += 1
//!                                             └─ panic/timeout → logged, failures.push
//!
//!   register / unregister ──► write lock (waits for in-flight deliveries),
//!                             swaps in a new listener set
//! ```
//!
//! ## Rules
//! - **Construction first**: if the event cannot be built no listener runs.
//! - **Isolation**: a panicking or timed-out listener is logged and skipped;
//!   the remaining listeners still receive the event.
//! - **Parallel dispatch**: deliveries only take the read lock, so concurrent
//!   dispatches do not wait for each other.
//! - **No retroactive delivery**: a listener registered after `dispatch`
//!   returned never sees that event.
//! - **No ordering across listeners**, no queue, no buffering.
//! - **Re-entrant publishing**: a listener may `dispatch`/`emit` on the same bus
//!   from `on_event`. The nested call delivers from the set the outer delivery
//!   holds and does not take the read lock again, so a queued `register` cannot
//!   wedge it. This holds on the delivering task only; a task spawned from
//!   `on_event` takes the lock like any other producer.
//! - A listener must not call `register`/`unregister` from `on_event`: the
//!   write lock would wait on the delivery that is calling it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::BusConfig;
use crate::core::runner::guarded;
use crate::error::{DispatchError, HookError};
use crate::events::{Args, Event, EventKey, EventRegistry};
use crate::listeners::{EventListener, ListenerTargets, same_listener};

/// Registered listeners; replaced as a whole on every change.
type ListenerSet = Arc<[Arc<dyn EventListener>]>;

tokio::task_local! {
    /// `(bus address, listener set)` of every delivery running on this task.
    static DELIVERING: Vec<(usize, ListenerSet)>;
}

/// Outcome of one delivery pass.
#[derive(Debug, Default)]
pub struct Delivery {
    /// Listeners whose `on_event` completed.
    pub delivered: usize,
    /// Listeners whose `on_event` panicked or timed out.
    pub failures: Vec<DeliveryFailure>,
}

impl Delivery {
    /// True if no listener failed.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of listeners the event was handed to.
    #[inline]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// One listener that failed to handle an event.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub listener: &'static str,
    pub error: HookError,
}

/// In-process event bus.
///
/// Build one per process and share it as `Arc<EventBus>`.
pub struct EventBus {
    listeners: RwLock<ListenerSet>,
    registry: EventRegistry,
    cfg: BusConfig,
}

impl EventBus {
    /// Creates a bus that constructs events through `registry`.
    pub fn new(registry: EventRegistry, cfg: BusConfig) -> Self {
        let empty: ListenerSet = Arc::new([]);
        Self {
            listeners: RwLock::new(empty),
            registry,
            cfg,
        }
    }

    /// A bus with only the lifecycle events registered and default settings.
    pub fn with_lifecycle() -> Self {
        Self::new(EventRegistry::with_lifecycle(), BusConfig::default())
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Adds `listener`; returns `false` if that same listener was already registered.
    pub async fn register(&self, listener: Arc<dyn EventListener>) -> bool {
        let mut listeners = self.listeners.write().await;
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        debug!(listener = listener.name(), "listener registered");
        let mut next = listeners.to_vec();
        next.push(listener);
        *listeners = next.into();
        true
    }

    /// Removes `listener`; returns `false` if it was not registered.
    pub async fn unregister(&self, listener: &Arc<dyn EventListener>) -> bool {
        let mut listeners = self.listeners.write().await;
        let next: Vec<_> = listeners
            .iter()
            .filter(|l| !same_listener(l, listener))
            .cloned()
            .collect();
        if next.len() == listeners.len() {
            return false;
        }
        debug!(listener = listener.name(), "listener unregistered");
        *listeners = next.into();
        true
    }

    pub async fn contains(&self, listener: &Arc<dyn EventListener>) -> bool {
        self.current().await.iter().any(|l| same_listener(l, listener))
    }

    pub async fn len(&self) -> usize {
        self.current().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.current().await.is_empty()
    }

    /// Builds the event registered under `key` and delivers it to every listener.
    pub async fn dispatch(&self, key: EventKey, args: Args) -> Result<Delivery, DispatchError> {
        let event = self.registry.construct(key, &args)?;
        Ok(self.publish(event.as_ref(), None).await)
    }

    /// Like [`EventBus::dispatch`], but only listeners whose concrete type is in
    /// `targets` receive the event.
    pub async fn dispatch_dedicated(
        &self,
        key: EventKey,
        args: Args,
        targets: &ListenerTargets,
    ) -> Result<Delivery, DispatchError> {
        let event = self.registry.construct(key, &args)?;
        Ok(self.publish(event.as_ref(), Some(targets)).await)
    }

    /// Delivers an already built event to every listener.
    pub async fn emit<E: Event>(&self, event: E) -> Delivery {
        self.publish(&event, None).await
    }

    /// Delivers an already built event to the listeners in `targets` only.
    pub async fn emit_dedicated<E: Event>(&self, event: E, targets: &ListenerTargets) -> Delivery {
        self.publish(&event, Some(targets)).await
    }

    fn address(&self) -> usize {
        std::ptr::from_ref(self).addr()
    }

    /// The set an enclosing delivery on this task holds for this bus, if any.
    fn delivering(&self) -> Option<ListenerSet> {
        let address = self.address();
        DELIVERING
            .try_with(|frames| {
                frames
                    .iter()
                    .find(|(bus, _)| *bus == address)
                    .map(|(_, set)| Arc::clone(set))
            })
            .ok()
            .flatten()
    }

    async fn current(&self) -> ListenerSet {
        match self.delivering() {
            Some(set) => set,
            None => Arc::clone(&*self.listeners.read().await),
        }
    }

    async fn publish(&self, event: &dyn Event, targets: Option<&ListenerTargets>) -> Delivery {
        if let Some(set) = self.delivering() {
            // Nested in a delivery of this bus: its read guard is still held.
            return self.deliver(&set, event, targets).await;
        }

        let guard = self.listeners.read().await;
        let set = Arc::clone(&*guard);
        let mut frames = DELIVERING.try_with(Vec::clone).unwrap_or_default();
        frames.push((self.address(), Arc::clone(&set)));
        let delivery = DELIVERING.scope(frames, self.deliver(&set, event, targets)).await;
        drop(guard);

        if let Some(targets) = targets.filter(|_| delivery.attempted() == 0) {
            debug!(
                event = %event.key(),
                targets = ?targets.names().collect::<Vec<_>>(),
                "no listener matched dedicated delivery"
            );
        }
        delivery
    }

    async fn deliver(
        &self,
        listeners: &[Arc<dyn EventListener>],
        event: &dyn Event,
        targets: Option<&ListenerTargets>,
    ) -> Delivery {
        let priority = event.priority();
        let timeout = self.cfg.listener_timeout();
        let mut delivery = Delivery::default();

        for listener in listeners
            .iter()
            .filter(|l| targets.is_none_or(|t| t.matches(Arc::as_ref(l))))
        {
            let call = async {
                listener.on_event(event, priority).await;
                Ok(())
            };
            match guarded(call, timeout).await {
                Ok(()) => delivery.delivered += 1,
                Err(error) => {
                    warn!(
                        listener = listener.name(),
                        event = %event.key(),
                        label = error.as_label(),
                        "listener failed to handle event: {error}"
                    );
                    delivery.failures.push(DeliveryFailure {
                        listener: listener.name(),
                        error,
                    });
                }
            }
        }
        delivery
    }
}
