//! # Module types and their static metadata.
//!
//! Every module declares a [`ModuleKind`]. The [`ModuleTypeRegistry`] maps the
//! kind to its [`ModuleTypeInfo`]: display name, mandatory flag, ordering
//! weight and the kinds it depends on.
//!
//! ## Rules
//! - kinds are unique;
//! - weights are unique (they break ties in the dependency order);
//! - the presence check at launch looks at exactly [`REQUIRED_KINDS`].
//!
//! ## Default registry
//! | kind          | display name        | weight | mandatory | depends on            |
//! |---------------|---------------------|--------|-----------|-----------------------|
//! | `credentials` | Credentials         | 1      | yes       |                       |
//! | `console`     | Console Logging     | 2      | yes       |                       |
//! | `database`    | Database Connection | 3      | no        | credentials           |
//! | `io`          | File Management     | 4      | no        |                       |
//! | `gateway`     | Remote Gateway      | 5      | yes       | credentials, console  |

use std::collections::HashMap;
use std::fmt;

use crate::error::RegistryError;

/// Symbolic module type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKind(&'static str);

impl ModuleKind {
    pub const CREDENTIALS: ModuleKind = ModuleKind("credentials");
    pub const CONSOLE: ModuleKind = ModuleKind("console");
    pub const DATABASE: ModuleKind = ModuleKind("database");
    pub const IO: ModuleKind = ModuleKind("io");
    pub const GATEWAY: ModuleKind = ModuleKind("gateway");

    /// A custom kind; register it with [`ModuleTypeRegistry::register`] before use.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Kinds that must each have a module in the active set.
pub const REQUIRED_KINDS: [ModuleKind; 3] =
    [ModuleKind::CREDENTIALS, ModuleKind::CONSOLE, ModuleKind::GATEWAY];

/// Static metadata of one module type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleTypeInfo {
    pub kind: ModuleKind,
    pub display_name: &'static str,
    pub mandatory: bool,
    pub weight: u32,
    pub depends_on: Vec<ModuleKind>,
}

impl ModuleTypeInfo {
    /// Optional type with no dependencies.
    pub fn new(kind: ModuleKind, display_name: &'static str, weight: u32) -> Self {
        Self {
            kind,
            display_name,
            mandatory: false,
            weight,
            depends_on: Vec::new(),
        }
    }

    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Declares that modules of this type start after modules of `kind`.
    #[must_use]
    pub fn depends_on(mut self, kind: ModuleKind) -> Self {
        if !self.depends_on.contains(&kind) {
            self.depends_on.push(kind);
        }
        self
    }
}

/// Kind → metadata lookup.
#[derive(Clone, Debug)]
pub struct ModuleTypeRegistry {
    types: HashMap<ModuleKind, ModuleTypeInfo>,
}

impl ModuleTypeRegistry {
    /// Registry without any type.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Adds a type; fails on a duplicate kind or weight.
    pub fn register(&mut self, info: ModuleTypeInfo) -> Result<(), RegistryError> {
        if self.types.contains_key(&info.kind) {
            return Err(RegistryError::DuplicateKind {
                kind: info.kind.name(),
            });
        }
        if let Some(existing) = self.types.values().find(|t| t.weight == info.weight) {
            return Err(RegistryError::DuplicateWeight {
                kind: info.kind.name(),
                existing: existing.kind.name(),
                weight: info.weight,
            });
        }
        self.types.insert(info.kind, info);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, info: ModuleTypeInfo) -> Result<Self, RegistryError> {
        self.register(info)?;
        Ok(self)
    }

    pub fn get(&self, kind: ModuleKind) -> Option<&ModuleTypeInfo> {
        self.types.get(&kind)
    }

    pub fn contains(&self, kind: ModuleKind) -> bool {
        self.types.contains_key(&kind)
    }

    /// Display name of `kind`, falling back to the kind's symbol.
    pub fn display_name(&self, kind: ModuleKind) -> &'static str {
        self.get(kind).map_or(kind.name(), |t| t.display_name)
    }

    /// Types sorted by weight.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleTypeInfo> {
        let mut types: Vec<&ModuleTypeInfo> = self.types.values().collect();
        types.sort_by_key(|t| t.weight);
        types.into_iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for ModuleTypeRegistry {
    /// The five core types (see module docs).
    fn default() -> Self {
        let types = [
            ModuleTypeInfo::new(ModuleKind::CREDENTIALS, "Credentials", 1).mandatory(),
            ModuleTypeInfo::new(ModuleKind::CONSOLE, "Console Logging", 2).mandatory(),
            ModuleTypeInfo::new(ModuleKind::DATABASE, "Database Connection", 3)
                .depends_on(ModuleKind::CREDENTIALS),
            ModuleTypeInfo::new(ModuleKind::IO, "File Management", 4),
            ModuleTypeInfo::new(ModuleKind::GATEWAY, "Remote Gateway", 5)
                .mandatory()
                .depends_on(ModuleKind::CREDENTIALS)
                .depends_on(ModuleKind::CONSOLE),
        ];
        Self {
            types: types.into_iter().map(|t| (t.kind, t)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_matches_core_types() {
        let reg = ModuleTypeRegistry::default();
        let order: Vec<_> = reg.iter().map(|t| t.kind).collect();
        assert_eq!(
            order,
            vec![
                ModuleKind::CREDENTIALS,
                ModuleKind::CONSOLE,
                ModuleKind::DATABASE,
                ModuleKind::IO,
                ModuleKind::GATEWAY
            ]
        );
        assert_eq!(reg.display_name(ModuleKind::CONSOLE), "Console Logging");
        for kind in REQUIRED_KINDS {
            assert!(reg.get(kind).unwrap().mandatory, "{kind} must be mandatory");
        }
        assert!(!reg.get(ModuleKind::DATABASE).unwrap().mandatory);
    }

    #[test]
    fn test_duplicate_weight_rejected() {
        let mut reg = ModuleTypeRegistry::default();
        let err = reg
            .register(ModuleTypeInfo::new(ModuleKind::new("metrics"), "Metrics", 3))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateWeight {
                kind: "metrics",
                existing: "database",
                weight: 3
            }
        );
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let err = ModuleTypeRegistry::default()
            .with(ModuleTypeInfo::new(ModuleKind::IO, "Files again", 40))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKind { kind: "io" });
    }

    #[test]
    fn test_custom_kind_registration() {
        let reg = ModuleTypeRegistry::empty()
            .with(ModuleTypeInfo::new(ModuleKind::new("metrics"), "Metrics", 10))
            .unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(ModuleKind::new("metrics")));
        assert!(!reg.contains(ModuleKind::CONSOLE));
        assert_eq!(reg.display_name(ModuleKind::new("metrics")), "Metrics");
        assert_eq!(reg.display_name(ModuleKind::new("ghost")), "ghost");
    }
}
