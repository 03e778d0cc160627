//! # Tracing-backed logging listener for debugging and demos.
//!
//! [`LogListener`] turns lifecycle events into `tracing` records and logs every
//! other event by key at `debug` level.
//!
//! ## Output format (with a fmt subscriber)
//! ```text
//! INFO  phase completed phase=init modules=4
//! WARN  module faulted module="Database Connection" phase=init escalated=false reason=...
//! INFO  shutdown requested reason=SIGINT
//! DEBUG event key=console.line priority=intermediate
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, ModuleFaulted, PhaseCompleted, Priority, ShutdownRequested};
use crate::listeners::EventListener;

/// Logs events through `tracing`.
///
/// Enabled via the `logging` feature. Install a `tracing` subscriber to see the output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

#[async_trait]
impl EventListener for LogListener {
    async fn on_event(&self, event: &dyn Event, priority: Priority) {
        if let Some(e) = event.downcast_ref::<PhaseCompleted>() {
            info!(phase = %e.phase, modules = e.modules, "phase completed");
        } else if let Some(e) = event.downcast_ref::<ModuleFaulted>() {
            if e.escalated {
                error!(
                    module = e.module,
                    phase = %e.phase,
                    reason = %e.reason,
                    "module faulted, launch aborted"
                );
            } else {
                warn!(module = e.module, phase = %e.phase, reason = %e.reason, "module faulted");
            }
        } else if let Some(e) = event.downcast_ref::<ShutdownRequested>() {
            info!(reason = %e.reason, "shutdown requested");
        } else {
            debug!(key = %event.key(), priority = priority.as_label(), "event");
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
