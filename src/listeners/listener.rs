//! # Core listener trait
//!
//! `EventListener` is the extension point for anything that wants to observe
//! events: every [`Module`](crate::Module) is one, and ad-hoc observers (a log
//! sink, an audit trail) can be registered next to them.
//!
//! ## Contract
//! - `on_event` runs **on the dispatching task**, before `dispatch` returns.
//!   Keep it short; hand long work to a worker of your own.
//! - A panic (or a timeout, when [`BusConfig::listener_timeout`](crate::BusConfig)
//!   is set) is caught by the bus and logged; the other listeners still receive
//!   the event.
//! - Identity is the `Arc` allocation: registering the same `Arc` twice is a no-op.
//!
//! ## Example
//! ```rust
//! use modvisor::{Event, EventListener, Priority};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl EventListener for Audit {
//!     async fn on_event(&self, event: &dyn Event, priority: Priority) {
//!         let _ = (event.key(), priority); // write audit record...
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use std::any::{TypeId, type_name};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HookError;
use crate::events::{Event, Priority};

/// Contract for event listeners.
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    /// Receives one event with the priority it was dispatched at.
    async fn on_event(&self, event: &dyn Event, priority: Priority);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Concrete type of the listener, matched by dedicated dispatch.
    fn listener_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Best-effort preparation run by the orchestrator before module `init`.
    ///
    /// Only called for listeners registered with
    /// [`OrchestratorBuilder::with_listener`](crate::OrchestratorBuilder::with_listener);
    /// errors are logged and ignored.
    async fn prepare(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// True if both handles point at the same listener allocation.
#[inline]
pub(crate) fn same_listener(a: &Arc<dyn EventListener>, b: &Arc<dyn EventListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Closed set of listener types for dedicated dispatch.
///
/// An empty set matches nothing.
///
/// ```rust
/// use modvisor::{Event, EventListener, ListenerTargets, Priority};
///
/// struct Database;
/// #[async_trait::async_trait]
/// impl EventListener for Database {
///     async fn on_event(&self, _: &dyn Event, _: Priority) {}
/// }
///
/// struct Console;
/// #[async_trait::async_trait]
/// impl EventListener for Console {
///     async fn on_event(&self, _: &dyn Event, _: Priority) {}
/// }
///
/// let only_db = ListenerTargets::of::<Database>();
/// assert!(only_db.matches(&Database));
/// assert!(!only_db.matches(&Console));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ListenerTargets {
    types: Vec<(TypeId, &'static str)>,
}

impl ListenerTargets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set containing only `T`.
    #[must_use]
    pub fn of<T: EventListener>() -> Self {
        Self::new().and::<T>()
    }

    /// Adds `T` to the set.
    #[must_use]
    pub fn and<T: EventListener>(mut self) -> Self {
        let id = TypeId::of::<T>();
        if !self.types.iter().any(|(t, _)| *t == id) {
            self.types.push((id, type_name::<T>()));
        }
        self
    }

    /// True if `listener`'s concrete type is in the set.
    pub fn matches(&self, listener: &dyn EventListener) -> bool {
        let id = listener.listener_type();
        self.types.iter().any(|(t, _)| *t == id)
    }

    /// Type names in the set (for logs).
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.iter().map(|(_, name)| *name)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[async_trait]
    impl EventListener for A {
        async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
    }

    #[async_trait]
    impl EventListener for B {
        async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
        fn name(&self) -> &'static str {
            "b"
        }
    }

    #[test]
    fn test_targets_match_concrete_type_through_trait_object() {
        let targets = ListenerTargets::of::<A>();
        let a: Arc<dyn EventListener> = Arc::new(A);
        let b: Arc<dyn EventListener> = Arc::new(B);
        assert!(targets.matches(a.as_ref()));
        assert!(!targets.matches(b.as_ref()));
        assert!(ListenerTargets::new().and::<A>().and::<B>().matches(b.as_ref()));
        assert!(!ListenerTargets::new().matches(a.as_ref()));
    }

    #[test]
    fn test_and_is_idempotent() {
        let targets = ListenerTargets::of::<A>().and::<A>().and::<B>();
        assert_eq!(targets.len(), 2);
        let names: Vec<_> = targets.names().collect();
        assert!(names[0].ends_with("::A") && names[1].ends_with("::B"));
    }

    #[test]
    fn test_identity_is_allocation() {
        let a1: Arc<dyn EventListener> = Arc::new(A);
        let a2: Arc<dyn EventListener> = Arc::new(A);
        assert!(same_listener(&a1, &a1.clone()));
        assert!(!same_listener(&a1, &a2));
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(A.name().ends_with("::A"));
        assert_eq!(B.name(), "b");
    }
}
