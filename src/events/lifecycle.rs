//! # Lifecycle events published by the orchestrator.
//!
//! | Event                 | Key                              | Priority       |
//! |-----------------------|----------------------------------|----------------|
//! | [`PhaseCompleted`]    | `lifecycle.phase_completed`      | `Low`          |
//! | [`ModuleFaulted`]     | `lifecycle.module_faulted`       | `High`         |
//! | [`ShutdownRequested`] | `lifecycle.shutdown_requested`   | `High`         |
//!
//! All three are registered by [`EventRegistry::with_lifecycle`](crate::EventRegistry::with_lifecycle),
//! so collaborators may also dispatch them by key.

use std::sync::Arc;

use crate::error::DispatchError;
use crate::events::{Args, Event, EventKey, FromArgs, Priority};
use crate::modules::Phase;

/// Every active module finished `phase`.
///
/// Args: `[Phase, usize]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCompleted {
    pub phase: Phase,
    /// Number of modules that ran the phase.
    pub modules: usize,
}

impl Event for PhaseCompleted {
    fn key(&self) -> EventKey {
        Self::KEY
    }
    fn priority(&self) -> Priority {
        Priority::Low
    }
}

impl FromArgs for PhaseCompleted {
    const KEY: EventKey = EventKey::new("lifecycle.phase_completed");

    fn from_args(args: &Args) -> Result<Self, DispatchError> {
        Ok(Self {
            phase: args.cloned(Self::KEY, 0)?,
            modules: args.cloned(Self::KEY, 1)?,
        })
    }
}

/// A module hook failed.
///
/// `escalated` is true when the failure aborted the launch sequence.
///
/// Args: `[&'static str, Phase, String, bool]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFaulted {
    pub module: &'static str,
    pub phase: Phase,
    pub reason: String,
    pub escalated: bool,
}

impl Event for ModuleFaulted {
    fn key(&self) -> EventKey {
        Self::KEY
    }
    fn priority(&self) -> Priority {
        Priority::High
    }
}

impl FromArgs for ModuleFaulted {
    const KEY: EventKey = EventKey::new("lifecycle.module_faulted");

    fn from_args(args: &Args) -> Result<Self, DispatchError> {
        Ok(Self {
            module: args.cloned(Self::KEY, 0)?,
            phase: args.cloned(Self::KEY, 1)?,
            reason: args.cloned(Self::KEY, 2)?,
            escalated: args.cloned(Self::KEY, 3)?,
        })
    }
}

/// The process is about to shut its modules down.
///
/// Args: `[Arc<str>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownRequested {
    /// What triggered the shutdown (signal name, module request, ...).
    pub reason: Arc<str>,
}

impl Event for ShutdownRequested {
    fn key(&self) -> EventKey {
        Self::KEY
    }
    fn priority(&self) -> Priority {
        Priority::High
    }
}

impl FromArgs for ShutdownRequested {
    const KEY: EventKey = EventKey::new("lifecycle.shutdown_requested");

    fn from_args(args: &Args) -> Result<Self, DispatchError> {
        Ok(Self {
            reason: args.cloned(Self::KEY, 0)?,
        })
    }
}
