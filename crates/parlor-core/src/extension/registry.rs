//! Ordered store of active extension modules.
//!
//! Registration order is broadcast order. Modules are addressed through
//! generational ids so that an id kept after its module was removed cannot
//! reach whichever module later reuses the slot.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::module::{ExtensionModule, ExtensionState};
use crate::error::RegistryError;

/// Handle to a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionId {
    index: u32,
    generation: u32,
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Snapshot of a registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub id: ExtensionId,
    pub name: String,
    pub version: semver::Version,
    pub path: PathBuf,
    pub state: ExtensionState,
}

impl ExtensionInfo {
    fn of(id: ExtensionId, module: &ExtensionModule) -> Self {
        Self {
            id,
            name: module.name().to_string(),
            version: module.version().clone(),
            path: module.path().to_path_buf(),
            state: module.state(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    module: Option<ExtensionModule>,
}

/// Registry of active extension modules.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<ExtensionId>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module. It becomes last in broadcast order.
    pub fn insert(&mut self, module: ExtensionModule) -> ExtensionId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.module = Some(module);
        let id = ExtensionId {
            index,
            generation: slot.generation,
        };
        self.order.push(id);
        id
    }

    /// Take a module out, keeping the relative order of the rest.
    pub fn remove(&mut self, id: ExtensionId) -> Result<ExtensionModule, RegistryError> {
        let slot = self.slot_mut(id)?;
        let module = slot.module.take().ok_or(RegistryError::StaleId(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|other| *other != id);
        Ok(module)
    }

    pub fn get(&self, id: ExtensionId) -> Result<&ExtensionModule, RegistryError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.module.as_ref())
            .ok_or(RegistryError::StaleId(id))
    }

    fn slot_mut(&mut self, id: ExtensionId) -> Result<&mut Slot, RegistryError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.module.is_some())
            .ok_or(RegistryError::StaleId(id))
    }

    pub fn contains(&self, id: ExtensionId) -> bool {
        self.get(id).is_ok()
    }

    /// Modules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ExtensionId, &ExtensionModule)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.get(*id).ok().map(|module| (*id, module)))
    }

    /// First module with the given declared name.
    pub fn find(&self, name: &str) -> Option<ExtensionId> {
        self.iter()
            .find(|(_, module)| module.name() == name)
            .map(|(id, _)| id)
    }

    /// Most recently registered module.
    pub fn last(&self) -> Option<ExtensionId> {
        self.order.last().copied()
    }

    pub fn infos(&self) -> Vec<ExtensionInfo> {
        self.iter()
            .map(|(id, module)| ExtensionInfo::of(id, module))
            .collect()
    }

    pub fn info(&self, id: ExtensionId) -> Result<ExtensionInfo, RegistryError> {
        self.get(id).map(|module| ExtensionInfo::of(id, module))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_extension_sdk::ExtensionRecord;
    use std::path::Path;

    static A: ExtensionRecord = ExtensionRecord::named(b"a\0", 1, 0);
    static B: ExtensionRecord = ExtensionRecord::named(b"b\0", 1, 0);
    static C: ExtensionRecord = ExtensionRecord::named(b"c\0", 1, 0);

    fn module(record: &ExtensionRecord) -> ExtensionModule {
        unsafe { ExtensionModule::from_record(record, Path::new("builtin"), None) }.unwrap()
    }

    fn names(registry: &ExtensionRegistry) -> Vec<String> {
        registry
            .iter()
            .map(|(_, m)| m.name().to_string())
            .collect()
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let mut registry = ExtensionRegistry::new();
        registry.insert(module(&C));
        registry.insert(module(&A));
        registry.insert(module(&B));
        assert_eq!(names(&registry), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut registry = ExtensionRegistry::new();
        registry.insert(module(&A));
        let b = registry.insert(module(&B));
        registry.insert(module(&C));

        let removed = registry.remove(b).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(names(&registry), vec!["a", "c"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_stale_id_is_rejected_after_slot_reuse() {
        let mut registry = ExtensionRegistry::new();
        let a = registry.insert(module(&A));
        registry.remove(a).unwrap();

        let b = registry.insert(module(&B));
        assert_ne!(a, b);
        assert_eq!(registry.get(a).unwrap_err(), RegistryError::StaleId(a));
        assert!(registry.remove(a).is_err());
        assert_eq!(registry.get(b).unwrap().name(), "b");
        // The reused slot goes to the end of the broadcast order.
        let c = registry.insert(module(&C));
        registry.remove(b).unwrap();
        let a2 = registry.insert(module(&A));
        assert_eq!(names(&registry), vec!["c", "a"]);
        assert_eq!(registry.last(), Some(a2));
        assert!(registry.contains(c));
    }

    #[test]
    fn test_find_returns_first_match() {
        let mut registry = ExtensionRegistry::new();
        let first = registry.insert(module(&A));
        registry.insert(module(&A));
        assert_eq!(registry.find("a"), Some(first));
        assert_eq!(registry.find("missing"), None);
    }

    #[test]
    fn test_infos_snapshot() {
        let mut registry = ExtensionRegistry::new();
        let id = registry.insert(module(&A));
        let info = registry.info(id).unwrap();
        assert_eq!(info.name, "a");
        assert_eq!(info.version, semver::Version::new(1, 0, 0));
        assert_eq!(info.state, ExtensionState::Loaded);
        assert_eq!(registry.infos(), vec![info]);
    }
}
