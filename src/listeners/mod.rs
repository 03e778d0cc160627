//! Listener contract and the built-in listeners.
//!
//! - [`EventListener`] trait implemented by modules and ad-hoc observers
//! - [`ListenerTargets`] type filter used by dedicated dispatch
//! - `LogListener` tracing sink _(feature `logging`)_

mod listener;
#[cfg(feature = "logging")]
mod log;

pub(crate) use listener::same_listener;
pub use listener::{EventListener, ListenerTargets};
#[cfg(feature = "logging")]
pub use log::LogListener;
