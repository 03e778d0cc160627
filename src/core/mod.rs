//! Runtime core: orchestration, guarded execution and shutdown.
//!
//! The public API from this module is [`Orchestrator`] (with its builder and
//! reports). Internal modules:
//! - [`orchestrator`]: phase-major lifecycle driving and shutdown;
//! - [`builder`]: freezes the module set and wires it onto the bus;
//! - [`runner`]: panic isolation and deadlines for hooks and listeners;
//! - [`workers`]: tracking of module background workers;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`status`]: launch/shutdown reports and module snapshots.

mod builder;
mod orchestrator;
pub(crate) mod runner;
mod shutdown;
mod status;
pub(crate) mod workers;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
pub use status::{LaunchReport, ModuleFault, ModuleSnapshot, ShutdownReport};
