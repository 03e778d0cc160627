//! # Positional arguments for key-based dispatch.
//!
//! [`Args`] is the heterogeneous argument array passed to
//! [`EventBus::dispatch`](crate::EventBus::dispatch). The registered constructor
//! for the key turns it into a typed event; nothing past that boundary sees
//! positional arguments.
//!
//! ## Accessors
//! - [`Args::at`] → raw [`Arg`] at a position (`None` if out of range);
//! - [`Args::get`] → typed reference (`None` if out of range **or** of another type);
//! - [`Args::require`] / [`Args::cloned`] → same, but with a [`DispatchError`]
//!   naming the key and position, for use inside constructors.
//!
//! ## Example
//! ```rust
//! use modvisor::{args, EventKey};
//!
//! let a = args!["db.internal", 5432u16];
//! assert_eq!(a.len(), 2);
//! assert_eq!(a.get::<&str>(0), Some(&"db.internal"));
//! assert_eq!(a.get::<String>(0), None); // wrong type, no panic
//! assert!(a.require::<u16>(EventKey::new("db.open"), 1).is_ok());
//! assert!(a.require::<u16>(EventKey::new("db.open"), 2).is_err());
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::events::EventKey;

/// One opaque positional argument.
///
/// Remembers the producer-side type name so mismatches can be reported.
#[derive(Clone)]
pub struct Arg {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Arg {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Typed view of the value; `None` if it is not a `T`.
    #[inline]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Type name recorded when the argument was built.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Arg").field(&self.type_name).finish()
    }
}

/// Ordered argument array.
#[derive(Clone, Debug, Default)]
pub struct Args {
    items: Vec<Arg>,
}

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value and returns the array (builder style).
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.items.push(Arg::new(value));
        self
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.items.push(Arg::new(value));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Raw argument at `index`.
    #[inline]
    pub fn at(&self, index: usize) -> Option<&Arg> {
        self.items.get(index)
    }

    /// Typed argument at `index`; `None` when absent or of another type.
    #[inline]
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.at(index).and_then(Arg::get::<T>)
    }

    /// Typed argument at `index` for the constructor of `key`.
    pub fn require<T: Any>(&self, key: EventKey, index: usize) -> Result<&T, DispatchError> {
        let arg = self.at(index).ok_or(DispatchError::MissingArgument {
            key,
            index,
            len: self.len(),
        })?;
        arg.get::<T>().ok_or(DispatchError::ArgumentType {
            key,
            index,
            expected: type_name::<T>(),
            found: arg.type_name(),
        })
    }

    /// Like [`Args::require`], cloning the value out.
    pub fn cloned<T: Any + Clone>(&self, key: EventKey, index: usize) -> Result<T, DispatchError> {
        self.require::<T>(key, index).cloned()
    }
}

/// Builds an [`Args`] array from a list of values.
///
/// ```rust
/// let a = modvisor::args![1u8, String::from("two"), true];
/// assert_eq!(a.len(), 3);
/// assert_eq!(a.get::<bool>(2), Some(&true));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: EventKey = EventKey::new("test.args");

    #[test]
    fn test_get_returns_none_on_type_mismatch() {
        let a = Args::new().with(42u32).with(String::from("x"));
        assert_eq!(a.get::<u32>(0), Some(&42));
        assert_eq!(a.get::<u64>(0), None);
        assert_eq!(a.get::<String>(1).map(String::as_str), Some("x"));
        assert_eq!(a.get::<u32>(5), None);
    }

    #[test]
    fn test_require_reports_position_and_types() {
        let a = Args::new().with(1i64);
        match a.require::<String>(KEY, 0) {
            Err(DispatchError::ArgumentType {
                index,
                expected,
                found,
                ..
            }) => {
                assert_eq!(index, 0);
                assert!(expected.contains("String"));
                assert_eq!(found, "i64");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            a.require::<i64>(KEY, 3).unwrap_err(),
            DispatchError::MissingArgument {
                key: KEY,
                index: 3,
                len: 1
            }
        );
    }

    #[test]
    fn test_macro_and_push() {
        let mut a = crate::args![1u8, "two"];
        a.push(3.0f64);
        assert_eq!(a.len(), 3);
        assert_eq!(a.cloned::<&str>(KEY, 1), Ok("two"));
        assert_eq!(a.at(2).map(Arg::type_name), Some("f64"));
        assert!(crate::args![].is_empty());
    }
}
