//! # Lifecycle phases and the stage a module has reached.
//!
//! ```text
//! Unstarted ─assert─► Asserted ─init─► Initialized ─pre-launch─► PreLaunched
//!     ─launch─► Launched ─post-launch─► PostLaunched ─shutdown─► Shutdown
//! ```
//!
//! A [`Stage`] only moves forward. A module whose `init` or `launch` failed
//! keeps the stage it had before the failing phase.

use std::fmt;

/// A lifecycle phase driven by the orchestrator across all modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Assert,
    Init,
    PreLaunch,
    Launch,
    PostLaunch,
    Shutdown,
}

impl Phase {
    /// Phases run by [`Orchestrator::launch_all`](crate::Orchestrator::launch_all) after assertion.
    pub const STARTUP: [Phase; 4] =
        [Phase::Init, Phase::PreLaunch, Phase::Launch, Phase::PostLaunch];

    /// Whether a mandatory module failing this phase aborts the sequence.
    ///
    /// `pre-launch` and `post-launch` failures are only logged.
    #[inline]
    pub fn escalates(self) -> bool {
        matches!(self, Phase::Init | Phase::Launch)
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Assert => "assert",
            Phase::Init => "init",
            Phase::PreLaunch => "pre-launch",
            Phase::Launch => "launch",
            Phase::PostLaunch => "post-launch",
            Phase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Furthest point of the lifecycle a module has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    #[default]
    Unstarted,
    Asserted,
    Initialized,
    PreLaunched,
    Launched,
    PostLaunched,
    Shutdown,
}

impl Stage {
    /// Stage reached once `phase` has run.
    pub fn after(phase: Phase) -> Stage {
        match phase {
            Phase::Assert => Stage::Asserted,
            Phase::Init => Stage::Initialized,
            Phase::PreLaunch => Stage::PreLaunched,
            Phase::Launch => Stage::Launched,
            Phase::PostLaunch => Stage::PostLaunched,
            Phase::Shutdown => Stage::Shutdown,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Stage::Unstarted => "unstarted",
            Stage::Asserted => "asserted",
            Stage::Initialized => "initialized",
            Stage::PreLaunched => "pre-launched",
            Stage::Launched => "launched",
            Stage::PostLaunched => "post-launched",
            Stage::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
