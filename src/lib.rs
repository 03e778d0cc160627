//! # modvisor
//!
//! **Modvisor** assembles a long-running process out of independently developed
//! modules (credentials, console, database, file management, remote gateway)
//! that start in a controlled order, talk through a typed in-process event bus,
//! and shut down cleanly.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Credentials  │   │   Console    │   │   Gateway    │   (impl Module)
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - ModuleTypeRegistry (display name, mandatory, weight, deps)     │
//! │  - startup order (dependency graph, ties broken by weight)        │
//! │  - phase driver: assert → init → pre-launch → launch → post-launch│
//! │  - Workers (TaskTracker) + runtime CancellationToken              │
//! └───────────────┬───────────────────────────────────────────────────┘
//!                 │ registers modules, publishes PhaseCompleted / ModuleFaulted
//!                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus (Arc, injected)                                         │
//! │  - EventRegistry: EventKey → constructor(Args)                    │
//! │  - RwLock<listeners>: write = register, read = dispatch           │
//! │  - guarded delivery: panic / timeout of one listener is isolated  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                       ┌───────────┼───────────┐
//!                       ▼           ▼           ▼
//!                  module.on_event  ...   extra listeners (LogListener, ...)
//! ```
//!
//! ### Lifecycle
//! ```text
//! build(bus) ──► launch_all()
//!   ├─► assert (all modules)          ─ Err ─► fatal: stderr + exit(1)
//!   ├─► REQUIRED_KINDS present?       ─ no  ─► fatal: stderr + exit(1)
//!   ├─► init        (all modules)     ─ mandatory Err ─► SequenceAborted
//!   ├─► pre-launch  (all modules)     ─ Err ─► logged
//!   ├─► launch      (all modules)     ─ mandatory Err ─► SequenceAborted
//!   └─► post-launch (all modules)     ─ Err ─► logged
//!
//! signal / request_shutdown ──► shutdown_all()
//!   ├─► shutdown hooks (startup or reverse order)
//!   ├─► cancel runtime token
//!   └─► wait for workers within grace
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                                  |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------------------|
//! | **Modules**       | Lifecycle hooks, identity and worker spawning.                | [`Module`], [`ModuleState`], [`ModuleContext`]      |
//! | **Types**         | Static module-type metadata and dependencies.                 | [`ModuleKind`], [`ModuleTypeRegistry`]              |
//! | **Orchestration** | Phase-major startup, failure policy, shutdown.                | [`Orchestrator`], [`OrchestratorBuilder`]           |
//! | **Events**        | Typed events, key-based construction, isolated delivery.      | [`Event`], [`EventRegistry`], [`EventBus`]          |
//! | **Listeners**     | Observe every event or only dedicated ones.                   | [`EventListener`], [`ListenerTargets`]              |
//! | **Errors**        | Typed errors per concern.                                     | [`HookError`], [`DispatchError`], [`LaunchError`]   |
//! | **Configuration** | Timeouts, grace period, shutdown order.                       | [`OrchestratorConfig`], [`BusConfig`]               |
//!
//! ## Optional features
//! - `logging`: exports a built-in tracing-backed [`LogListener`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use modvisor::{
//!     Event, EventBus, EventListener, HookError, Module, ModuleContext, ModuleKind,
//!     ModuleState, Orchestrator, OrchestratorConfig, Priority,
//! };
//!
//! struct Core {
//!     kind: ModuleKind,
//!     state: ModuleState,
//! }
//!
//! #[async_trait::async_trait]
//! impl EventListener for Core {
//!     async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
//!     fn name(&self) -> &'static str { self.kind.name() }
//! }
//!
//! #[async_trait::async_trait]
//! impl Module for Core {
//!     fn kind(&self) -> ModuleKind { self.kind }
//!     fn state(&self) -> &ModuleState { &self.state }
//!     async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> { Ok(()) }
//!     async fn launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> { Ok(()) }
//!     async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(EventBus::with_lifecycle());
//!     let mut builder = Orchestrator::builder(OrchestratorConfig::default());
//!     for kind in [ModuleKind::GATEWAY, ModuleKind::CONSOLE, ModuleKind::CREDENTIALS] {
//!         builder = builder.with_module(Arc::new(Core { kind, state: ModuleState::new() }));
//!     }
//!     let mut orchestrator = builder.build(bus).await?;
//!     assert_eq!(orchestrator.startup_order(), ["credentials", "console", "gateway"]);
//!
//!     let report = orchestrator.launch_all().await?;
//!     assert!(report.is_clean());
//!     assert!(orchestrator.shutdown_all().await.is_clean());
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod listeners;
mod modules;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{BusConfig, OrchestratorConfig, ShutdownOrder};
pub use crate::core::{
    LaunchReport, ModuleFault, ModuleSnapshot, Orchestrator, OrchestratorBuilder, ShutdownReport,
    ShutdownSignal, wait_for_shutdown_signal,
};
pub use error::{DispatchError, HookError, LaunchError, RegistryError};
pub use events::{
    Arg, Args, Delivery, DeliveryFailure, Event, EventBus, EventKey, EventRegistry, FromArgs,
    ModuleFaulted, PhaseCompleted, Priority, ShutdownRequested,
};
pub use listeners::{EventListener, ListenerTargets};
pub use modules::{
    Module, ModuleContext, ModuleKind, ModuleState, ModuleTypeInfo, ModuleTypeRegistry, Phase,
    REQUIRED_KINDS, Stage,
};

// Optional: expose a simple built-in logger listener (demo/reference only).
#[cfg(feature = "logging")]
pub use listeners::LogListener;
