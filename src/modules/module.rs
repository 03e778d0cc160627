//! # Core module contract.
//!
//! A [`Module`] is an [`EventListener`] with a declared [`ModuleKind`] and six
//! lifecycle hooks. The orchestrator calls each hook for **all** modules before
//! moving to the next phase.
//!
//! | Hook          | Default | Failure on a mandatory module | Failure on an optional module |
//! |---------------|---------|-------------------------------|-------------------------------|
//! | `assert`      | `Ok`    | process exits                 | process exits                 |
//! | `init`        | -       | launch aborted                | module skipped afterwards     |
//! | `pre_launch`  | `Ok`    | logged                        | logged                        |
//! | `launch`      | -       | launch aborted                | module skipped afterwards     |
//! | `post_launch` | `Ok`    | logged                        | logged                        |
//! | `shutdown`    | -       | logged                        | logged                        |
//!
//! Hooks take `&self`: the same `Arc` is registered on the bus, so state a
//! module changes from its hooks lives behind interior mutability
//! ([`ModuleState`] covers the common flags).
//!
//! ## Example
//! ```rust
//! use modvisor::{
//!     Event, EventListener, HookError, Module, ModuleContext, ModuleKind, ModuleState, Priority,
//! };
//!
//! #[derive(Default)]
//! struct Files {
//!     state: ModuleState,
//! }
//!
//! #[async_trait::async_trait]
//! impl EventListener for Files {
//!     async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
//!     fn name(&self) -> &'static str { "files" }
//! }
//!
//! #[async_trait::async_trait]
//! impl Module for Files {
//!     fn kind(&self) -> ModuleKind { ModuleKind::IO }
//!     fn state(&self) -> &ModuleState { &self.state }
//!
//!     async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
//!         std::fs::create_dir_all(std::env::temp_dir().join("files"))?;
//!         Ok(())
//!     }
//!     async fn launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
//!         self.state.set_running(true);
//!         Ok(())
//!     }
//!     async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
//!         self.state.set_running(false);
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::HookError;
use crate::listeners::EventListener;
use crate::modules::{ModuleContext, ModuleKind};

/// Lifecycle contract of a core module.
#[async_trait]
pub trait Module: EventListener {
    /// Module type, looked up in the [`ModuleTypeRegistry`](crate::ModuleTypeRegistry).
    fn kind(&self) -> ModuleKind;

    /// Identity and advisory flags.
    fn state(&self) -> &ModuleState;

    fn id(&self) -> Uuid {
        self.state().id()
    }

    /// Checks environmental preconditions before anything else runs.
    ///
    /// Synchronous and fatal: logging may not be configured yet.
    fn assert(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Allocates resources and subscribes to what the module needs.
    async fn init(&self, ctx: &ModuleContext) -> Result<(), HookError>;

    async fn pre_launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Starts steady-state work, usually through [`ModuleContext::spawn_worker`].
    async fn launch(&self, ctx: &ModuleContext) -> Result<(), HookError>;

    async fn post_launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Stops workers and releases resources.
    ///
    /// Called for every module that completed `init`, even when a later phase failed.
    async fn shutdown(&self, ctx: &ModuleContext) -> Result<(), HookError>;
}

/// Identity plus `running`/`healthy` flags, meant to be embedded in a module.
///
/// The flags are advisory: the orchestrator only reads them for
/// [`Orchestrator::snapshot`](crate::Orchestrator::snapshot).
#[derive(Debug)]
pub struct ModuleState {
    id: Uuid,
    running: AtomicBool,
    healthy: AtomicBool,
}

impl ModuleState {
    /// Fresh random identity, not running, healthy.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            running: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_and_flags() {
        let state = ModuleState::default();
        assert!(!state.is_running());
        assert!(state.is_healthy());
        state.set_running(true);
        state.set_healthy(false);
        assert!(state.is_running());
        assert!(!state.is_healthy());
    }

    #[test]
    fn test_every_state_gets_its_own_id() {
        assert_ne!(ModuleState::new().id(), ModuleState::new().id());
        let id = Uuid::new_v4();
        assert_eq!(ModuleState::with_id(id).id(), id);
    }
}
