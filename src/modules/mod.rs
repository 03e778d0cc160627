//! Modules: lifecycle contract, type metadata and startup ordering.
//!
//! ## Contents
//! - [`Module`], [`ModuleState`] hook contract and embeddable identity/flags
//! - [`ModuleContext`] handle passed to each hook (bus, token, workers)
//! - [`ModuleKind`], [`ModuleTypeInfo`], [`ModuleTypeRegistry`] static type metadata
//! - [`Phase`], [`Stage`] lifecycle vocabulary
//! - startup ordering over declared dependencies (crate-private)

mod context;
mod kind;
mod module;
pub(crate) mod order;
mod stage;

pub use context::ModuleContext;
pub use kind::{ModuleKind, ModuleTypeInfo, ModuleTypeRegistry, REQUIRED_KINDS};
pub use module::{Module, ModuleState};
pub use stage::{Phase, Stage};
