//! # Orchestrator: drives every module through the lifecycle, phase by phase.
//!
//! The [`Orchestrator`] owns the active module set (frozen by
//! [`OrchestratorBuilder::build`](crate::OrchestratorBuilder::build)), the
//! runtime token, and the tracker for module workers. It is a client of the
//! [`EventBus`] like any module: it publishes lifecycle events, it never relays
//! module traffic.
//!
//! ## Launch sequence
//! ```text
//! launch_all()
//!   ├─► assert      every module (sync, panic-isolated)
//!   │                 └─ Err ─► LaunchError::AssertionFailed            (fatal)
//!   ├─► presence    REQUIRED_KINDS all present?
//!   │                 └─ no  ─► LaunchError::MissingMandatory           (fatal)
//!   ├─► prepare     extra listeners (best effort, errors logged)
//!   └─► for phase in [init, pre-launch, launch, post-launch]:
//!         for module in startup order (active only):
//!             guarded(hook(ctx), hook_timeout)
//!               ├─ Ok  ─► stage = after(phase)
//!               └─ Err ─► publish ModuleFaulted
//!                         ├─ init/launch + mandatory ─► LaunchError::SequenceAborted
//!                         ├─ init/launch + optional  ─► module skipped from now on
//!                         └─ pre-/post-launch        ─► logged, stage still advances
//!         publish PhaseCompleted{ phase, modules }
//! ```
//!
//! ## Shutdown sequence
//! ```text
//! shutdown_all()
//!   ├─► shutdown hook for every module with stage ≥ Initialized
//!   │     (ShutdownOrder::Startup or ShutdownOrder::Reverse; failures collected)
//!   ├─► publish PhaseCompleted{ Shutdown }
//!   ├─► runtime_token.cancel()          → every ModuleContext::token()
//!   ├─► workers.wait_with_grace(grace)  → stuck worker names
//!   └─► unregister modules and extra listeners from the bus
//! ```
//!
//! ## Rules
//! - Phases are **phase-major**: no module starts phase N+1 before every active
//!   module finished phase N.
//! - Only `assert` and the presence check terminate the process
//!   ([`Orchestrator::launch_or_exit`]); a sequence abort is returned to the caller,
//!   who should still call [`Orchestrator::shutdown_all`] to release what was initialized.
//! - `launch_all` runs at most once per orchestrator.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{OrchestratorConfig, ShutdownOrder};
use crate::core::runner::guarded;
use crate::core::shutdown::wait_for_shutdown_signal;
use crate::core::status::{LaunchReport, ModuleFault, ModuleSnapshot, ShutdownReport};
use crate::core::workers::Workers;
use crate::error::{HookError, LaunchError};
use crate::events::{EventBus, ModuleFaulted, PhaseCompleted, ShutdownRequested};
use crate::listeners::EventListener;
use crate::modules::{
    Module, ModuleContext, ModuleTypeInfo, ModuleTypeRegistry, Phase, REQUIRED_KINDS, Stage,
};

/// One module of the active set plus the orchestrator's bookkeeping.
pub(crate) struct ModuleSlot {
    pub(crate) module: Arc<dyn Module>,
    pub(crate) info: ModuleTypeInfo,
    pub(crate) ctx: ModuleContext,
    pub(crate) stage: Stage,
    pub(crate) active: bool,
}

/// Sequences module lifecycles.
pub struct Orchestrator {
    cfg: OrchestratorConfig,
    bus: Arc<EventBus>,
    types: ModuleTypeRegistry,
    /// Startup order.
    slots: Vec<ModuleSlot>,
    listeners: Vec<Arc<dyn EventListener>>,
    runtime: CancellationToken,
    shutdown_request: CancellationToken,
    workers: Arc<Workers>,
    launched: bool,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: OrchestratorConfig,
        bus: Arc<EventBus>,
        types: ModuleTypeRegistry,
        slots: Vec<ModuleSlot>,
        listeners: Vec<Arc<dyn EventListener>>,
        runtime: CancellationToken,
        shutdown_request: CancellationToken,
        workers: Arc<Workers>,
    ) -> Self {
        Self {
            cfg,
            bus,
            types,
            slots,
            listeners,
            runtime,
            shutdown_request,
            workers,
            launched: false,
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.cfg
    }

    /// Module names in startup order.
    pub fn startup_order(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.module.name()).collect()
    }

    /// Token that ends [`run_until_signal`](Self::run_until_signal) when cancelled.
    ///
    /// Shared with every [`ModuleContext::request_shutdown`].
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown_request.clone()
    }

    /// Runs assertion, presence check and the four startup phases.
    pub async fn launch_all(&mut self) -> Result<LaunchReport, LaunchError> {
        if self.launched {
            return Err(LaunchError::AlreadyLaunched);
        }
        self.launched = true;

        self.assert_all().await?;
        self.check_required()?;
        self.prepare_listeners().await;

        let mut report = LaunchReport::default();
        for phase in Phase::STARTUP {
            self.run_phase(phase, &mut report).await?;
        }
        report.active = self
            .slots
            .iter()
            .filter(|s| s.active)
            .map(|s| s.module.name())
            .collect();
        info!(active = ?report.active, faults = report.faults.len(), "launch sequence complete");
        Ok(report)
    }

    /// Like [`launch_all`](Self::launch_all), but terminates the process on a fatal error.
    ///
    /// The diagnostic goes to stderr: logging may not be set up yet.
    pub async fn launch_or_exit(&mut self) -> Result<LaunchReport, LaunchError> {
        match self.launch_all().await {
            Err(e) if e.is_fatal_to_process() => {
                eprintln!("fatal: {e}");
                std::process::exit(1);
            }
            other => other,
        }
    }

    /// Launches, waits for a termination signal or a shutdown request, then shuts down.
    ///
    /// A non-fatal launch error still runs `shutdown_all` before being returned.
    pub async fn run_until_signal(&mut self) -> Result<ShutdownReport, LaunchError> {
        if let Err(e) = self.launch_or_exit().await {
            error!(label = e.as_label(), "launch failed: {e}");
            self.shutdown_all().await;
            return Err(e);
        }

        let request = self.shutdown_request.clone();
        let reason: Arc<str> = tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(signal) => Arc::from(signal.as_label()),
                Err(e) => {
                    warn!("signal handlers unavailable, waiting for a shutdown request: {e}");
                    request.cancelled().await;
                    Arc::from("requested")
                }
            },
            _ = request.cancelled() => Arc::from("requested"),
        };

        info!(%reason, "shutdown requested");
        self.bus
            .emit(ShutdownRequested {
                reason: Arc::clone(&reason),
            })
            .await;
        Ok(self.shutdown_all().await)
    }

    /// Runs every due shutdown hook, cancels the runtime token and waits for workers.
    ///
    /// Never fails: hook failures and stuck workers are reported, not propagated.
    pub async fn shutdown_all(&mut self) -> ShutdownReport {
        let timeout = self.cfg.hook_timeout();
        let mut indices: Vec<usize> = (0..self.slots.len()).collect();
        if self.cfg.shutdown_order == ShutdownOrder::Reverse {
            indices.reverse();
        }

        let mut report = ShutdownReport::default();
        let mut ran = 0usize;
        for idx in indices {
            let slot = &mut self.slots[idx];
            if slot.stage < Stage::Initialized || slot.stage == Stage::Shutdown {
                continue;
            }
            let name = slot.module.name();
            debug!(module = name, "shutting down");
            let shutdown = hook(slot.module.as_ref(), &slot.ctx, Phase::Shutdown);
            let res = guarded(shutdown, timeout).await;
            slot.stage = Stage::Shutdown;
            ran += 1;
            if let Err(error) = res {
                warn!(
                    module = name,
                    phase = %Phase::Shutdown,
                    label = error.as_label(),
                    "shutdown hook failed: {error}"
                );
                report.failures.push(ModuleFault {
                    module: name,
                    phase: Phase::Shutdown,
                    error,
                    skipped: false,
                });
            }
        }

        if ran > 0 {
            self.bus
                .emit(PhaseCompleted {
                    phase: Phase::Shutdown,
                    modules: ran,
                })
                .await;
        }

        self.runtime.cancel();
        report.stuck_workers = self.workers.wait_with_grace(self.cfg.grace).await;

        for slot in &self.slots {
            let listener: Arc<dyn EventListener> = slot.module.clone();
            self.bus.unregister(&listener).await;
        }
        for listener in &self.listeners {
            self.bus.unregister(listener).await;
        }

        info!(
            failures = report.failures.len(),
            stuck = report.stuck_workers.len(),
            "shutdown complete"
        );
        report
    }

    /// Per-module diagnostics in startup order.
    pub fn snapshot(&self) -> Vec<ModuleSnapshot> {
        self.slots
            .iter()
            .map(|s| {
                let state = s.module.state();
                ModuleSnapshot {
                    name: s.module.name(),
                    kind: s.info.kind,
                    display_name: s.info.display_name,
                    id: state.id(),
                    stage: s.stage,
                    active: s.active,
                    running: state.is_running(),
                    healthy: state.is_healthy(),
                }
            })
            .collect()
    }

    /// Sorted names of module workers that are still running.
    pub fn workers(&self) -> Vec<String> {
        self.workers.snapshot()
    }

    async fn assert_all(&mut self) -> Result<(), LaunchError> {
        for slot in &mut self.slots {
            let module = slot.module.as_ref();
            guarded(hook(module, &slot.ctx, Phase::Assert), None)
                .await
                .map_err(|source| LaunchError::AssertionFailed {
                    module: module.name(),
                    source,
                })?;
            slot.stage = Stage::Asserted;
        }
        Ok(())
    }

    fn check_required(&self) -> Result<(), LaunchError> {
        for kind in REQUIRED_KINDS {
            if !self.slots.iter().any(|s| s.info.kind == kind) {
                return Err(LaunchError::MissingMandatory {
                    kind: kind.name(),
                    display_name: self.types.display_name(kind),
                });
            }
        }
        Ok(())
    }

    async fn prepare_listeners(&self) {
        let timeout = self.cfg.hook_timeout();
        for listener in &self.listeners {
            if let Err(e) = guarded(listener.prepare(), timeout).await {
                warn!(
                    listener = listener.name(),
                    label = e.as_label(),
                    "listener preparation failed: {e}"
                );
            }
        }
    }

    async fn run_phase(
        &mut self,
        phase: Phase,
        report: &mut LaunchReport,
    ) -> Result<(), LaunchError> {
        let timeout = self.cfg.hook_timeout();
        let bus = Arc::clone(&self.bus);
        let mut ran = 0usize;
        debug!(%phase, "phase starting");

        for idx in 0..self.slots.len() {
            let slot = &mut self.slots[idx];
            if !slot.active {
                continue;
            }
            let name = slot.module.name();
            let mandatory = slot.info.mandatory;
            match guarded(hook(slot.module.as_ref(), &slot.ctx, phase), timeout).await {
                Ok(()) => {
                    slot.stage = Stage::after(phase);
                    ran += 1;
                }
                Err(error) if phase.escalates() && mandatory => {
                    error!(
                        module = name,
                        %phase,
                        label = error.as_label(),
                        "mandatory module failed: {error}"
                    );
                    publish_fault(&bus, name, phase, &error, true).await;
                    return Err(LaunchError::SequenceAborted {
                        module: name,
                        phase,
                        source: error,
                    });
                }
                Err(error) => {
                    let skipped = phase.escalates();
                    if skipped {
                        slot.active = false;
                        warn!(
                            module = name,
                            %phase,
                            label = error.as_label(),
                            "optional module failed, skipping it: {error}"
                        );
                    } else {
                        slot.stage = Stage::after(phase);
                        ran += 1;
                        let label = error.as_label();
                        warn!(module = name, %phase, label, "hook failed: {error}");
                    }
                    publish_fault(&bus, name, phase, &error, false).await;
                    report.faults.push(ModuleFault {
                        module: name,
                        phase,
                        error,
                        skipped,
                    });
                }
            }
        }

        info!(%phase, modules = ran, "phase completed");
        bus.emit(PhaseCompleted { phase, modules: ran }).await;
        Ok(())
    }
}

async fn publish_fault(
    bus: &EventBus,
    module: &'static str,
    phase: Phase,
    error: &HookError,
    escalated: bool,
) {
    bus.emit(ModuleFaulted {
        module,
        phase,
        reason: error.to_string(),
        escalated,
    })
    .await;
}

/// The hook `phase` names on `module`. `assert` runs synchronously inside the returned future.
fn hook<'a>(
    module: &'a dyn Module,
    ctx: &'a ModuleContext,
    phase: Phase,
) -> BoxFuture<'a, Result<(), HookError>> {
    match phase {
        Phase::Assert => Box::pin(async move { module.assert() }),
        Phase::Init => module.init(ctx),
        Phase::PreLaunch => module.pre_launch(ctx),
        Phase::Launch => module.launch(ctx),
        Phase::PostLaunch => module.post_launch(ctx),
        Phase::Shutdown => module.shutdown(ctx),
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("modules", &self.startup_order())
            .field("launched", &self.launched)
            .finish()
    }
}
