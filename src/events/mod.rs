//! Events: data model, constructor registry and the in-process bus.
//!
//! ## Contents
//! - [`Event`], [`EventKey`], [`Priority`] event identity and metadata
//! - [`Args`], [`Arg`] positional, type-erased constructor arguments
//! - [`EventRegistry`], [`FromArgs`] key → constructor mapping
//! - [`EventBus`] listener set with guarded synchronous delivery
//! - lifecycle events published by the orchestrator
//!
//! ## Quick reference
//! - **Publishers**: the orchestrator (`PhaseCompleted`, `ModuleFaulted`,
//!   `ShutdownRequested`) and any module holding the bus through its context.
//! - **Consumers**: every registered module plus the extra listeners given to
//!   the builder.

mod args;
mod bus;
mod event;
mod lifecycle;
mod registry;

pub use args::{Arg, Args};
pub use bus::{Delivery, DeliveryFailure, EventBus};
pub use event::{Event, EventKey, Priority};
pub use lifecycle::{ModuleFaulted, PhaseCompleted, ShutdownRequested};
pub use registry::{EventRegistry, FromArgs};
