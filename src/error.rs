//! Error types used by the modvisor runtime, its bus and its modules.
//!
//! This module defines four enums, one per concern:
//!
//! - [`HookError`]: a module hook (or listener preparation) failed.
//! - [`DispatchError`]: an event could not be constructed from `(key, args)`.
//! - [`RegistryError`]: a module-type or event registry rejected an entry.
//! - [`LaunchError`]: the orchestrator could not bring the process up.
//!
//! All of them expose `as_label()` for logs/metrics. [`LaunchError`] also tells
//! whether the failure must terminate the process ([`LaunchError::is_fatal_to_process`]).

use std::time::Duration;

use thiserror::Error;

use crate::events::EventKey;
use crate::modules::Phase;

/// # Errors produced by module hooks.
///
/// Returned by [`Module`](crate::Module) hooks and by
/// [`EventListener::prepare`](crate::EventListener::prepare). The runtime also
/// produces `Timeout` and `Panicked` itself when a hook hangs or unwinds.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HookError {
    /// An environmental precondition does not hold (missing file, variable, ...).
    #[error("precondition failed: {reason}")]
    Precondition {
        /// What was expected and not found.
        reason: String,
    },

    /// The hook ran and failed.
    #[error("hook failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The hook did not return within the configured hook timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The hook panicked; the panic was caught by the runtime.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// I/O failure while the hook was touching its environment.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HookError {
    /// Shorthand for [`HookError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HookError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`HookError::Precondition`].
    pub fn precondition(reason: impl Into<String>) -> Self {
        HookError::Precondition {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::HookError;
    ///
    /// assert_eq!(HookError::fail("boom").as_label(), "hook_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Precondition { .. } => "hook_precondition",
            HookError::Fail { .. } => "hook_failed",
            HookError::Timeout { .. } => "hook_timeout",
            HookError::Panicked { .. } => "hook_panicked",
            HookError::Io(_) => "hook_io",
        }
    }
}

/// # Errors produced while building an event for dispatch.
///
/// Raised to the caller of [`EventBus::dispatch`](crate::EventBus::dispatch);
/// when one is returned, no listener has been invoked.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The undefined sentinel key was dispatched.
    #[error("the undefined event key cannot be dispatched")]
    UndefinedKey,

    /// No constructor is registered for the key.
    #[error("no event registered under key `{key}`")]
    UnknownKey {
        /// The key that was dispatched.
        key: EventKey,
    },

    /// The argument array is shorter than the event shape requires.
    #[error("event `{key}` expects an argument at position {index}, got {len} argument(s)")]
    MissingArgument {
        /// Event being constructed.
        key: EventKey,
        /// Position that was read.
        index: usize,
        /// Number of arguments supplied.
        len: usize,
    },

    /// The argument at `index` has a different type than the event shape requires.
    #[error("event `{key}` argument {index}: expected `{expected}`, found `{found}`")]
    ArgumentType {
        /// Event being constructed.
        key: EventKey,
        /// Position that was read.
        index: usize,
        /// Type the constructor asked for.
        expected: &'static str,
        /// Type the producer supplied.
        found: &'static str,
    },

    /// The constructor rejected the arguments for another reason.
    #[error("event `{key}` could not be constructed: {reason}")]
    Construction {
        /// Event being constructed.
        key: EventKey,
        /// Why construction failed.
        reason: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::UndefinedKey => "dispatch_undefined_key",
            DispatchError::UnknownKey { .. } => "dispatch_unknown_key",
            DispatchError::MissingArgument { .. } => "dispatch_missing_argument",
            DispatchError::ArgumentType { .. } => "dispatch_argument_type",
            DispatchError::Construction { .. } => "dispatch_construction",
        }
    }
}

/// # Errors produced by the module-type and event registries.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A module type with this kind is already registered.
    #[error("module type `{kind}` is already registered")]
    DuplicateKind {
        /// Offending kind name.
        kind: &'static str,
    },

    /// Another module type already uses this ordering weight.
    #[error("ordering weight {weight} of `{kind}` is already used by `{existing}`")]
    DuplicateWeight {
        /// Kind being registered.
        kind: &'static str,
        /// Kind that owns the weight.
        existing: &'static str,
        /// The weight in conflict.
        weight: u32,
    },

    /// A module references a kind the type registry does not know.
    #[error("module type `{kind}` is not registered")]
    UnknownKind {
        /// Unknown kind name.
        kind: &'static str,
    },

    /// Module dependencies form a cycle.
    #[error("module dependencies form a cycle between: {kinds:?}")]
    DependencyCycle {
        /// Kinds that could not be ordered.
        kinds: Vec<&'static str>,
    },

    /// The undefined sentinel key cannot carry a constructor.
    #[error("the undefined event key cannot be registered")]
    UndefinedKey,

    /// A constructor is already registered for this key.
    #[error("event key `{key}` is already registered")]
    DuplicateKey {
        /// Offending key.
        key: EventKey,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateKind { .. } => "registry_duplicate_kind",
            RegistryError::DuplicateWeight { .. } => "registry_duplicate_weight",
            RegistryError::UnknownKind { .. } => "registry_unknown_kind",
            RegistryError::DependencyCycle { .. } => "registry_dependency_cycle",
            RegistryError::UndefinedKey => "registry_undefined_key",
            RegistryError::DuplicateKey { .. } => "registry_duplicate_key",
        }
    }
}

/// # Errors produced while launching the module set.
///
/// Two kinds are fatal to the process (see [`LaunchError::is_fatal_to_process`]);
/// `SequenceAborted` stops the remaining phases but leaves the decision of
/// exiting to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LaunchError {
    /// A module's precondition assertion failed.
    #[error("module `{module}` failed its precondition assertion: {source}")]
    AssertionFailed {
        /// Module display name.
        module: &'static str,
        /// What the assertion reported.
        #[source]
        source: HookError,
    },

    /// One of the required module types has no module in the active set.
    #[error("mandatory module `{display_name}` is missing")]
    MissingMandatory {
        /// Kind that is missing.
        kind: &'static str,
        /// Display name of the missing type (e.g. "Console Logging").
        display_name: &'static str,
    },

    /// A mandatory module failed `init` or `launch`; the remaining phases were not run.
    #[error("launch sequence aborted: mandatory module `{module}` failed during {phase}: {source}")]
    SequenceAborted {
        /// Module display name.
        module: &'static str,
        /// Phase in which it failed.
        phase: Phase,
        /// The hook error.
        #[source]
        source: HookError,
    },

    /// The active set could not be ordered.
    #[error(transparent)]
    Ordering(#[from] RegistryError),

    /// `launch_all` was called more than once.
    #[error("modules have already been launched")]
    AlreadyLaunched,
}

impl LaunchError {
    /// True for failures that must terminate the process immediately.
    ///
    /// # Example
    /// ```
    /// use modvisor::LaunchError;
    ///
    /// let err = LaunchError::MissingMandatory { kind: "console", display_name: "Console Logging" };
    /// assert!(err.is_fatal_to_process());
    /// assert!(!LaunchError::AlreadyLaunched.is_fatal_to_process());
    /// ```
    pub fn is_fatal_to_process(&self) -> bool {
        matches!(
            self,
            LaunchError::AssertionFailed { .. } | LaunchError::MissingMandatory { .. }
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LaunchError::AssertionFailed { .. } => "launch_assertion_failed",
            LaunchError::MissingMandatory { .. } => "launch_missing_mandatory",
            LaunchError::SequenceAborted { .. } => "launch_sequence_aborted",
            LaunchError::Ordering(_) => "launch_ordering",
            LaunchError::AlreadyLaunched => "launch_already_launched",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mandatory_names_display_name() {
        let err = LaunchError::MissingMandatory {
            kind: "console",
            display_name: "Console Logging",
        };
        assert_eq!(err.to_string(), "mandatory module `Console Logging` is missing");
    }

    #[test]
    fn test_sequence_aborted_names_module_and_phase() {
        let err = LaunchError::SequenceAborted {
            module: "db",
            phase: Phase::Init,
            source: HookError::fail("no socket"),
        };
        let msg = err.to_string();
        assert!(msg.contains("`db`"));
        assert!(msg.contains("init"));
        assert!(msg.contains("no socket"));
        assert!(!err.is_fatal_to_process());
    }

    #[test]
    fn test_dispatch_error_messages() {
        let err = DispatchError::ArgumentType {
            key: EventKey::new("db.credentials"),
            index: 1,
            expected: "alloc::string::String",
            found: "u32",
        };
        assert_eq!(err.as_label(), "dispatch_argument_type");
        assert!(err.to_string().contains("db.credentials"));
    }
}
