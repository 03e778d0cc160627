//! # Startup order from declared dependencies.
//!
//! ```text
//! kinds present in the active set
//!   └─► edges dep ─► kind (only when dep is present)
//!         └─► Kahn's algorithm, ready set = min-heap on weight
//!               ├─ all kinds emitted ─► expand kinds to module indices
//!               └─ kinds left over   ─► RegistryError::DependencyCycle
//! ```
//!
//! ## Rules
//! - a dependency on a kind with no module in the set is ignored;
//! - among kinds whose dependencies are satisfied, the lowest weight goes first,
//!   so without dependencies the order is plain weight order;
//! - several modules of the same kind keep their insertion order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::RegistryError;
use crate::modules::{ModuleKind, ModuleTypeRegistry};

/// Orders module indices so that every module starts after its dependencies.
///
/// `kinds[i]` is the kind of module `i` (insertion order).
pub(crate) fn startup_order(
    kinds: &[ModuleKind],
    types: &ModuleTypeRegistry,
) -> Result<Vec<usize>, RegistryError> {
    let mut present: Vec<ModuleKind> = Vec::new();
    for kind in kinds {
        if !present.contains(kind) {
            present.push(*kind);
        }
    }

    let mut weight = HashMap::with_capacity(present.len());
    for kind in &present {
        let info = types
            .get(*kind)
            .ok_or(RegistryError::UnknownKind { kind: kind.name() })?;
        weight.insert(*kind, info.weight);
    }

    let mut indegree: HashMap<ModuleKind, usize> = present.iter().map(|k| (*k, 0)).collect();
    let mut dependents: HashMap<ModuleKind, Vec<ModuleKind>> = HashMap::new();
    for kind in &present {
        let info = types
            .get(*kind)
            .ok_or(RegistryError::UnknownKind { kind: kind.name() })?;
        for dep in info.depends_on.iter().filter(|d| weight.contains_key(*d)) {
            dependents.entry(*dep).or_default().push(*kind);
            *indegree.entry(*kind).or_default() += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<(u32, ModuleKind)>> = indegree
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(k, _)| Reverse((weight[k], *k)))
        .collect();

    let mut sorted = Vec::with_capacity(present.len());
    while let Some(Reverse((_, kind))) = ready.pop() {
        sorted.push(kind);
        for next in dependents.get(&kind).into_iter().flatten() {
            if let Some(n) = indegree.get_mut(next) {
                *n -= 1;
                if *n == 0 {
                    ready.push(Reverse((weight[next], *next)));
                }
            }
        }
    }

    if sorted.len() != present.len() {
        let mut kinds: Vec<&'static str> = present
            .iter()
            .filter(|k| !sorted.contains(k))
            .map(|k| k.name())
            .collect();
        kinds.sort_unstable();
        return Err(RegistryError::DependencyCycle { kinds });
    }

    Ok(sorted
        .iter()
        .flat_map(|kind| {
            kinds
                .iter()
                .enumerate()
                .filter(move |(_, k)| *k == kind)
                .map(|(i, _)| i)
        })
        .collect())
}
