//! # Event registry: symbolic keys → constructors.
//!
//! [`EventRegistry`] maps an [`EventKey`] to a closure that builds the concrete
//! event from positional [`Args`]. The bus consults it on every key-based
//! dispatch, so producers never need to name the event type.
//!
//! ## Rules
//! - one key maps to exactly one constructor (duplicates are rejected);
//! - [`EventKey::UNDEFINED`] cannot be registered and is never constructible;
//! - a constructor must produce an event whose [`Event::key`] equals the key it
//!   was registered under, otherwise construction fails.
//!
//! Event types that know their own key and argument layout implement
//! [`FromArgs`] and are registered with [`EventRegistry::register_event`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{DispatchError, RegistryError};
use crate::events::lifecycle::{ModuleFaulted, PhaseCompleted, ShutdownRequested};
use crate::events::{Args, Event, EventKey};

type Constructor = Arc<dyn Fn(&Args) -> Result<Arc<dyn Event>, DispatchError> + Send + Sync>;

/// An event that can be built from positional arguments.
///
/// # Example
/// ```rust
/// use modvisor::{args, Args, DispatchError, Event, EventKey, EventRegistry, FromArgs};
///
/// #[derive(Debug)]
/// struct ConsoleLine {
///     line: String,
/// }
///
/// impl Event for ConsoleLine {
///     fn key(&self) -> EventKey {
///         Self::KEY
///     }
/// }
///
/// impl FromArgs for ConsoleLine {
///     const KEY: EventKey = EventKey::new("console.line");
///     fn from_args(args: &Args) -> Result<Self, DispatchError> {
///         Ok(Self { line: args.cloned(Self::KEY, 0)? })
///     }
/// }
///
/// let mut registry = EventRegistry::new();
/// registry.register_event::<ConsoleLine>().unwrap();
/// let ev = registry.construct(ConsoleLine::KEY, &args![String::from("help")]).unwrap();
/// assert_eq!(ev.downcast_ref::<ConsoleLine>().unwrap().line, "help");
/// ```
pub trait FromArgs: Event + Sized {
    /// Key the event is registered under.
    const KEY: EventKey;

    /// Builds the event from positional arguments.
    fn from_args(args: &Args) -> Result<Self, DispatchError>;
}

/// Key → constructor mapping.
#[derive(Clone, Default)]
pub struct EventRegistry {
    constructors: HashMap<EventKey, Constructor>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the runtime's own lifecycle events
    /// ([`PhaseCompleted`], [`ModuleFaulted`], [`ShutdownRequested`]).
    #[must_use]
    pub fn with_lifecycle() -> Self {
        let mut registry = Self::new();
        for (key, ctor) in [
            (PhaseCompleted::KEY, erase(PhaseCompleted::from_args)),
            (ModuleFaulted::KEY, erase(ModuleFaulted::from_args)),
            (ShutdownRequested::KEY, erase(ShutdownRequested::from_args)),
        ] {
            registry.constructors.insert(key, ctor);
        }
        registry
    }

    /// Registers a constructor under `key`.
    pub fn register<E, F>(&mut self, key: EventKey, ctor: F) -> Result<(), RegistryError>
    where
        E: Event,
        F: Fn(&Args) -> Result<E, DispatchError> + Send + Sync + 'static,
    {
        if key.is_undefined() {
            return Err(RegistryError::UndefinedKey);
        }
        if self.constructors.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }
        self.constructors.insert(key, erase(ctor));
        Ok(())
    }

    /// Registers `E` under [`FromArgs::KEY`].
    pub fn register_event<E: FromArgs>(&mut self) -> Result<(), RegistryError> {
        self.register(E::KEY, E::from_args)
    }

    #[inline]
    pub fn contains(&self, key: EventKey) -> bool {
        self.constructors.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered keys, sorted by name.
    pub fn keys(&self) -> Vec<EventKey> {
        let mut keys: Vec<EventKey> = self.constructors.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Builds the event registered under `key` from `args`.
    pub fn construct(&self, key: EventKey, args: &Args) -> Result<Arc<dyn Event>, DispatchError> {
        if key.is_undefined() {
            return Err(DispatchError::UndefinedKey);
        }
        let ctor = self
            .constructors
            .get(&key)
            .ok_or(DispatchError::UnknownKey { key })?;
        let event = ctor(args)?;
        if event.key() != key {
            return Err(DispatchError::Construction {
                key,
                reason: format!("constructor produced an event keyed `{}`", event.key()),
            });
        }
        Ok(event)
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

fn erase<E, F>(ctor: F) -> Constructor
where
    E: Event,
    F: Fn(&Args) -> Result<E, DispatchError> + Send + Sync + 'static,
{
    Arc::new(move |args| ctor(args).map(|ev| Arc::new(ev) as Arc<dyn Event>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::modules::Phase;

    #[derive(Debug)]
    struct Greeting {
        name: String,
    }

    impl Event for Greeting {
        fn key(&self) -> EventKey {
            Self::KEY
        }
    }

    impl FromArgs for Greeting {
        const KEY: EventKey = EventKey::new("test.greeting");
        fn from_args(args: &Args) -> Result<Self, DispatchError> {
            Ok(Self {
                name: args.cloned(Self::KEY, 0)?,
            })
        }
    }

    #[test]
    fn test_construct_registered_event() {
        let mut reg = EventRegistry::new();
        reg.register_event::<Greeting>().unwrap();
        let ev = reg
            .construct(Greeting::KEY, &args![String::from("ada")])
            .unwrap();
        assert_eq!(ev.downcast_ref::<Greeting>().unwrap().name, "ada");
    }

    #[test]
    fn test_unknown_and_undefined_keys() {
        let reg = EventRegistry::new();
        assert_eq!(
            reg.construct(EventKey::new("nope"), &Args::new()).unwrap_err(),
            DispatchError::UnknownKey {
                key: EventKey::new("nope")
            }
        );
        assert_eq!(
            reg.construct(EventKey::UNDEFINED, &Args::new()).unwrap_err(),
            DispatchError::UndefinedKey
        );
    }

    #[test]
    fn test_shape_mismatch_is_a_dispatch_error() {
        let mut reg = EventRegistry::new();
        reg.register_event::<Greeting>().unwrap();
        let err = reg.construct(Greeting::KEY, &args![42u32]).unwrap_err();
        assert_eq!(err.as_label(), "dispatch_argument_type");
    }

    #[test]
    fn test_duplicate_and_undefined_registration_rejected() {
        let mut reg = EventRegistry::new();
        reg.register_event::<Greeting>().unwrap();
        assert_eq!(
            reg.register_event::<Greeting>(),
            Err(RegistryError::DuplicateKey { key: Greeting::KEY })
        );
        assert_eq!(
            reg.register(EventKey::UNDEFINED, Greeting::from_args),
            Err(RegistryError::UndefinedKey)
        );
    }

    #[test]
    fn test_constructor_must_match_its_key() {
        let mut reg = EventRegistry::new();
        reg.register(EventKey::new("test.alias"), Greeting::from_args)
            .unwrap();
        let err = reg
            .construct(EventKey::new("test.alias"), &args![String::from("x")])
            .unwrap_err();
        assert_eq!(err.as_label(), "dispatch_construction");
    }

    #[test]
    fn test_lifecycle_registry() {
        let reg = EventRegistry::with_lifecycle();
        assert_eq!(reg.len(), 3);
        let ev = reg
            .construct(PhaseCompleted::KEY, &args![Phase::Launch, 3usize])
            .unwrap();
        let done = ev.downcast_ref::<PhaseCompleted>().unwrap();
        assert_eq!(done.phase, Phase::Launch);
        assert_eq!(done.modules, 3);
    }
}
