//! One-hot flags backing tool predicates

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named 0/1 markers. Absent and 0 mean the same thing.
///
/// Clones share the same table: the agent writes through one handle and
/// predicates read through theirs.
#[derive(Clone, Default)]
pub struct FlagTable {
    flags: Arc<DashMap<String, u8>>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str) {
        self.flags.insert(name.to_string(), 1);
    }

    pub fn clear(&self, name: &str) {
        self.flags.insert(name.to_string(), 0);
    }

    /// 1 if set, 0 if cleared or never seen.
    pub fn get(&self, name: &str) -> u8 {
        self.flags.get(name).map(|v| *v).unwrap_or(0)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name) == 1
    }

    pub fn clear_all(&self) {
        self.flags.clear();
    }

    /// Names currently set to 1, sorted.
    pub fn active(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags
            .iter()
            .filter(|e| *e.value() == 1)
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn snapshot(&self) -> BTreeMap<String, u8> {
        self.flags
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    /// Both handles refer to the same table.
    pub fn same(&self, other: &FlagTable) -> bool {
        Arc::ptr_eq(&self.flags, &other.flags)
    }
}

impl std::fmt::Debug for FlagTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.snapshot())
    }
}
