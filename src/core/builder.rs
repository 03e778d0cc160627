//! # Builder: collects modules and listeners, then freezes them into an [`Orchestrator`].
//!
//! `build` orders the active set, creates the per-module contexts and registers
//! every module and extra listener on the bus. The same `Arc` added twice is kept once.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::orchestrator::{ModuleSlot, Orchestrator};
use super::workers::Workers;
use crate::config::OrchestratorConfig;
use crate::error::{LaunchError, RegistryError};
use crate::events::EventBus;
use crate::listeners::{EventListener, same_listener};
use crate::modules::{Module, ModuleContext, ModuleTypeRegistry, Stage, order};

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    cfg: OrchestratorConfig,
    types: ModuleTypeRegistry,
    modules: Vec<Arc<dyn Module>>,
    listeners: Vec<Arc<dyn EventListener>>,
}

impl OrchestratorBuilder {
    /// Creates a builder using the default module-type registry.
    pub fn new(cfg: OrchestratorConfig) -> Self {
        Self {
            cfg,
            types: ModuleTypeRegistry::default(),
            modules: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Replaces the module-type registry.
    pub fn with_types(mut self, types: ModuleTypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Adds a module to the active set. Adding the same `Arc` twice is a no-op.
    pub fn with_module<M: Module>(self, module: Arc<M>) -> Self {
        let module: Arc<dyn Module> = module;
        self.with_modules([module])
    }

    /// Adds already type-erased modules, skipping ones already in the set.
    pub fn with_modules(mut self, modules: impl IntoIterator<Item = Arc<dyn Module>>) -> Self {
        for module in modules {
            let known = self
                .modules
                .iter()
                .any(|m| std::ptr::addr_eq(Arc::as_ptr(m), Arc::as_ptr(&module)));
            if !known {
                self.modules.push(module);
            }
        }
        self
    }

    /// Adds a non-module listener; it is registered on the bus and prepared before `init`.
    pub fn with_listener<L: EventListener>(mut self, listener: Arc<L>) -> Self {
        let listener: Arc<dyn EventListener> = listener;
        if !self.listeners.iter().any(|l| same_listener(l, &listener)) {
            self.listeners.push(listener);
        }
        self
    }

    /// Freezes the active set, orders it and registers everything on `bus`.
    ///
    /// Fails with [`LaunchError::Ordering`] if a module's kind is unknown or the
    /// declared dependencies form a cycle.
    pub async fn build(self, bus: Arc<EventBus>) -> Result<Orchestrator, LaunchError> {
        let kinds: Vec<_> = self.modules.iter().map(|m| m.kind()).collect();
        let order = order::startup_order(&kinds, &self.types)?;

        let runtime = CancellationToken::new();
        let shutdown_request = CancellationToken::new();
        let workers = Workers::new();

        let mut slots = Vec::with_capacity(order.len());
        for idx in order {
            let module = Arc::clone(&self.modules[idx]);
            let kind = module.kind();
            let info = self
                .types
                .get(kind)
                .cloned()
                .ok_or(RegistryError::UnknownKind { kind: kind.name() })?;
            let ctx = ModuleContext::new(
                Arc::clone(&bus),
                module.name(),
                kind,
                module.id(),
                &runtime,
                shutdown_request.clone(),
                Arc::clone(&workers),
            );
            let listener: Arc<dyn EventListener> = module.clone();
            bus.register(listener).await;
            debug!(module = module.name(), %kind, weight = info.weight, "module registered");
            slots.push(ModuleSlot {
                module,
                info,
                ctx,
                stage: Stage::Unstarted,
                active: true,
            });
        }
        for listener in &self.listeners {
            bus.register(Arc::clone(listener)).await;
        }

        Ok(Orchestrator::new_internal(
            self.cfg,
            bus,
            self.types,
            slots,
            self.listeners,
            runtime,
            shutdown_request,
            workers,
        ))
    }
}

impl Orchestrator {
    /// Starts building an orchestrator.
    pub fn builder(cfg: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }
}
