//! # Events carried by the bus.
//!
//! An event is a plain struct with named, typed fields that implements [`Event`].
//! Each event declares:
//! - an [`EventKey`]: the symbolic name it is registered and dispatched under;
//! - a [`Priority`]: handed to every listener alongside the event.
//!
//! Listeners receive `&dyn Event` and recover the concrete shape with
//! [`downcast_ref`](trait.Event.html#method.downcast_ref), which returns `None`
//! for any other event.
//!
//! ## Example
//! ```rust
//! use modvisor::{Event, EventKey, Priority};
//!
//! #[derive(Debug)]
//! struct UserJoined {
//!     user: String,
//! }
//!
//! impl Event for UserJoined {
//!     fn key(&self) -> EventKey {
//!         EventKey::new("gateway.user_joined")
//!     }
//!     fn priority(&self) -> Priority {
//!         Priority::Low
//!     }
//! }
//!
//! let ev: Box<dyn Event> = Box::new(UserJoined { user: "ada".into() });
//! assert_eq!(ev.downcast_ref::<UserJoined>().map(|e| e.user.as_str()), Some("ada"));
//! assert_eq!(ev.priority(), Priority::Low);
//! ```

use std::any::Any;
use std::fmt;

/// Dispatch priority declared by an event.
///
/// The bus does not reorder listeners by priority; the value is passed to
/// each listener so it can decide how urgently to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    High,
    #[default]
    Intermediate,
    Low,
}

impl Priority {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Intermediate => "intermediate",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Symbolic name of an event shape.
///
/// Keys are compared by name. [`EventKey::UNDEFINED`] is a valid value that
/// maps to no shape; the registry refuses to register it and the bus refuses
/// to dispatch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey(&'static str);

impl EventKey {
    /// Sentinel key with no event shape.
    pub const UNDEFINED: EventKey = EventKey("");

    /// Creates a key from a static name. An empty name is the undefined key.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The key's name (empty for [`EventKey::UNDEFINED`]).
    pub const fn name(&self) -> &'static str {
        self.0
    }

    #[inline]
    pub const fn is_undefined(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EventKey {
    fn default() -> Self {
        EventKey::UNDEFINED
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("<undefined>")
        } else {
            f.write_str(self.0)
        }
    }
}

/// Contract for values delivered through the bus.
///
/// Events are immutable once built: listeners only ever see `&dyn Event`.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// Symbolic key this event is registered and dispatched under.
    fn key(&self) -> EventKey;

    /// Priority handed to listeners with this event.
    fn priority(&self) -> Priority {
        Priority::Intermediate
    }
}

impl dyn Event {
    /// True if the event's concrete type is `T`.
    #[inline]
    pub fn is<T: Event>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Returns the event as `T`, or `None` if it has another shape.
    #[inline]
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}
