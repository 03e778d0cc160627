//! # Reports and diagnostics returned by the orchestrator.
//!
//! - [`LaunchReport`]: outcome of a successful `launch_all` (recoverable faults included)
//! - [`ShutdownReport`]: failed shutdown hooks and workers still running after `grace`
//! - [`ModuleSnapshot`]: point-in-time view of one module

use uuid::Uuid;

use crate::error::HookError;
use crate::modules::{ModuleKind, Phase, Stage};

/// A hook failure that did not abort the sequence.
#[derive(Debug)]
pub struct ModuleFault {
    pub module: &'static str,
    pub phase: Phase,
    pub error: HookError,
    /// The module was dropped from the remaining phases.
    pub skipped: bool,
}

/// Outcome of [`Orchestrator::launch_all`](crate::Orchestrator::launch_all).
#[derive(Debug, Default)]
pub struct LaunchReport {
    /// Modules still active after post-launch, in startup order.
    pub active: Vec<&'static str>,
    /// Recoverable failures, in the order they happened.
    pub faults: Vec<ModuleFault>,
}

impl LaunchReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Optional modules skipped after failing `init` or `launch`.
    pub fn skipped(&self) -> impl Iterator<Item = &ModuleFault> {
        self.faults.iter().filter(|f| f.skipped)
    }
}

/// Outcome of [`Orchestrator::shutdown_all`](crate::Orchestrator::shutdown_all).
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Shutdown hooks that failed; logged, never propagated.
    pub failures: Vec<ModuleFault>,
    /// Sorted names of workers that outlived the grace period.
    pub stuck_workers: Vec<String>,
}

impl ShutdownReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.stuck_workers.is_empty()
    }
}

/// Diagnostics for one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSnapshot {
    pub name: &'static str,
    pub kind: ModuleKind,
    pub display_name: &'static str,
    pub id: Uuid,
    /// Last phase the module completed.
    pub stage: Stage,
    /// False once an optional module was skipped.
    pub active: bool,
    pub running: bool,
    pub healthy: bool,
}
