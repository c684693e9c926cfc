use std::collections::BTreeMap;

use dashmap::DashMap;

/// Logical element name → candidate that last resolved.
///
/// Pure performance aid: entries never expire on their own and are evicted
/// by the resolver as soon as they stop matching.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, logical_name: &str) -> Option<String> {
        self.entries
            .get(logical_name)
            .map(|entry| entry.value().clone())
    }

    pub fn put(&self, logical_name: &str, locator: &str) {
        self.entries
            .insert(logical_name.to_string(), locator.to_string());
    }

    /// Evict the entry only if it still points at `locator`.
    ///
    /// Returns `true` when an entry was removed.
    pub fn evict_if(&self, logical_name: &str, locator: &str) -> bool {
        self.entries
            .remove_if(logical_name, |_, cached| cached == locator)
            .is_some()
    }

    pub fn evict(&self, logical_name: &str) -> Option<String> {
        self.entries.remove(logical_name).map(|(_, locator)| locator)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
