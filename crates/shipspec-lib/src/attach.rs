//! Resolve a ship's slot lists against the module catalog.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::model::{Catalog, Module, RecordId};

/// A module id listed by a ship but absent from the module catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnresolvedModule {
    pub slot: String,
    pub module_id: RecordId,
}

/// Per-slot view of the modules a ship can mount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedModules<'a> {
    slots: BTreeMap<&'a str, BTreeMap<RecordId, &'a Module>>,
    unresolved: Vec<UnresolvedModule>,
}

impl<'a> AttachedModules<'a> {
    /// Modules attached under `slot`, keyed by module id. Empty when the ship
    /// has no such slot.
    pub fn slot(&self, slot: &str) -> impl Iterator<Item = &'a Module> + '_ {
        self.slots
            .get(slot)
            .into_iter()
            .flat_map(|modules| modules.values().copied())
    }

    pub fn contains(&self, slot: &str, module_id: RecordId) -> bool {
        self.slots
            .get(slot)
            .is_some_and(|modules| modules.contains_key(&module_id))
    }

    /// References that could not be resolved, in slot then list order.
    pub fn unresolved(&self) -> &[UnresolvedModule] {
        &self.unresolved
    }

    pub fn into_unresolved(self) -> Vec<UnresolvedModule> {
        self.unresolved
    }
}

/// Look up every module id listed per slot.
///
/// Ids missing from `catalog` are left out of the tree and recorded as
/// [`UnresolvedModule`]s instead. A slot whose ids all fail to resolve is
/// still present, with no modules.
pub fn attach_modules<'a>(
    slots: &'a BTreeMap<String, Vec<RecordId>>,
    catalog: &'a Catalog<Module>,
) -> AttachedModules<'a> {
    let mut attached = AttachedModules::default();

    for (slot, module_ids) in slots {
        let resolved = attached.slots.entry(slot.as_str()).or_default();
        for &module_id in module_ids {
            match catalog.get(&module_id) {
                Some(module) => {
                    resolved.insert(module_id, module);
                }
                None => {
                    debug!(slot = %slot, module_id, "module missing from catalog");
                    attached.unresolved.push(UnresolvedModule {
                        slot: slot.clone(),
                        module_id,
                    });
                }
            }
        }
    }

    attached
}
