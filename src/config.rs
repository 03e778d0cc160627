//! # Runtime configuration.
//!
//! Provides [`OrchestratorConfig`] (phase driving, shutdown) and [`BusConfig`]
//! (listener delivery).
//!
//! ## Sentinel values
//! - `hook_timeout = 0s` → hooks may run for as long as they like
//! - `listener_timeout = 0s` → listeners may run for as long as they like
//! - `grace = 0s` → do not wait for module workers after shutdown hooks

use std::time::Duration;

/// Order in which `shutdown` hooks run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShutdownOrder {
    /// Same order as startup (credentials first, gateway last).
    #[default]
    Startup,
    /// Reverse startup order (dependents stop before their dependencies).
    Reverse,
}

/// Event bus settings.
#[derive(Clone, Debug, Default)]
pub struct BusConfig {
    /// Upper bound for a single listener's `on_event`.
    ///
    /// A listener exceeding it is reported as failed for that event and
    /// delivery moves on to the next listener.
    pub listener_timeout: Duration,
}

impl BusConfig {
    /// Listener timeout as an `Option` (`None` = unbounded).
    #[inline]
    pub fn listener_timeout(&self) -> Option<Duration> {
        (!self.listener_timeout.is_zero()).then_some(self.listener_timeout)
    }
}

/// Orchestrator settings.
///
/// ## Field semantics
/// - `hook_timeout`: per-hook deadline for init/pre-launch/launch/post-launch/shutdown (`0s` = none)
/// - `grace`: how long `shutdown_all` waits for module workers to exit
/// - `shutdown_order`: whether shutdown reuses the startup order or reverses it
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Deadline for one hook invocation.
    ///
    /// A hook exceeding it fails with [`HookError::Timeout`](crate::HookError::Timeout)
    /// and the usual phase policy applies. `assert` is synchronous and is not bounded.
    pub hook_timeout: Duration,

    /// Maximum wait for workers spawned through
    /// [`ModuleContext::spawn_worker`](crate::ModuleContext::spawn_worker)
    /// once every shutdown hook has run and the runtime token is cancelled.
    pub grace: Duration,

    /// Shutdown hook ordering.
    pub shutdown_order: ShutdownOrder,
}

impl OrchestratorConfig {
    /// Hook timeout as an `Option` (`None` = unbounded).
    #[inline]
    pub fn hook_timeout(&self) -> Option<Duration> {
        (!self.hook_timeout.is_zero()).then_some(self.hook_timeout)
    }
}

impl Default for OrchestratorConfig {
    /// Default configuration:
    ///
    /// - `hook_timeout = 0s` (no deadline)
    /// - `grace = 10s`
    /// - `shutdown_order = ShutdownOrder::Startup`
    fn default() -> Self {
        Self {
            hook_timeout: Duration::ZERO,
            grace: Duration::from_secs(10),
            shutdown_order: ShutdownOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_unbounded() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.hook_timeout(), None);
        assert_eq!(BusConfig::default().listener_timeout(), None);

        let cfg = OrchestratorConfig {
            hook_timeout: Duration::from_millis(250),
            ..OrchestratorConfig::default()
        };
        assert_eq!(cfg.hook_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_default_shutdown_order_reuses_startup() {
        assert_eq!(
            OrchestratorConfig::default().shutdown_order,
            ShutdownOrder::Startup
        );
    }
}
