//! Surrogate key assignment for dimension tables
//!
//! Each dimension gets one [`Registry`] that hands out dense integer keys in
//! first-seen order. The registries are the only record of which natural keys
//! are already in the database, so they live exactly as long as one import.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Ordered tuple of natural-key components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey(Box<[String]>);

impl NaturalKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Registry length at a point in time, see [`Registry::rollback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Natural key -> surrogate key map for one dimension
#[derive(Debug, Clone)]
pub struct Registry<K> {
    ids: HashMap<K, i64>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Clone> Registry<K> {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Look up `key`, assigning the next id on first sight.
    /// Returns the id and whether it was just assigned.
    pub fn resolve(&mut self, key: K) -> (i64, bool) {
        if let Some(&id) = self.ids.get(&key) {
            return (id, false);
        }
        let id = self.order.len() as i64 + 1;
        self.order.push(key.clone());
        self.ids.insert(key, id);
        (id, true)
    }

    pub fn get(&self, key: &K) -> Option<i64> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in id order (the key at index `i` has id `i + 1`)
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.order.len())
    }

    /// Forget every key assigned after `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for key in self.order.drain(checkpoint.0..) {
            self.ids.remove(&key);
        }
    }
}

impl<K: Eq + Hash + Clone> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// One registry per dimension table for the lifetime of an import
#[derive(Debug, Default)]
pub struct RegistrySet {
    registries: HashMap<&'static str, Registry<NaturalKey>>,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self, table: &str) -> Option<&Registry<NaturalKey>> {
        self.registries.get(table)
    }

    pub fn registry_mut(&mut self, table: &'static str) -> &mut Registry<NaturalKey> {
        self.registries.entry(table).or_default()
    }

    pub fn get(&self, table: &str, key: &NaturalKey) -> Option<i64> {
        self.registry(table).and_then(|r| r.get(key))
    }

    pub fn len(&self, table: &str) -> usize {
        self.registry(table).map_or(0, Registry::len)
    }

    pub fn checkpoint(&self) -> HashMap<&'static str, Checkpoint> {
        self.registries
            .iter()
            .filter(|(_, registry)| !registry.is_empty())
            .map(|(&table, registry)| (table, registry.checkpoint()))
            .collect()
    }

    /// Undo every assignment made since `checkpoint` was taken. Registries
    /// missing from `checkpoint` were empty and are cleared.
    pub fn rollback(&mut self, checkpoint: &HashMap<&'static str, Checkpoint>) {
        for (table, registry) in self.registries.iter_mut() {
            let mark = checkpoint.get(table).copied().unwrap_or(Checkpoint(0));
            registry.rollback(mark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_in_first_seen_order() {
        let mut registry = Registry::new();
        assert_eq!(registry.resolve("Bank"), (1, true));
        assert_eq!(registry.resolve("Club House"), (2, true));
        assert_eq!(registry.resolve("Bank"), (1, false));
        assert_eq!(registry.resolve("Oregon"), (3, true));

        let keys: Vec<_> = registry.keys().copied().collect();
        assert_eq!(keys, vec!["Bank", "Club House", "Oregon"]);
    }

    #[test]
    fn test_composite_keys_differ_in_any_component() {
        let mut registry = Registry::new();
        let (a, _) = registry.resolve(NaturalKey::new(["A", "Bank", "Bomb"]));
        let (b, _) = registry.resolve(NaturalKey::new(["A", "Bank", "Secure Area"]));
        let (c, new) = registry.resolve(NaturalKey::new(["A", "Bank", "Bomb"]));

        assert_ne!(a, b);
        assert_eq!(a, c);
        assert!(!new);
    }

    #[test]
    fn test_tuple_keys_do_not_collide_on_delimiters() {
        let mut registry = Registry::new();
        let (a, _) = registry.resolve(NaturalKey::new(["a;b", "c"]));
        let (b, _) = registry.resolve(NaturalKey::new(["a", "b;c"]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rollback_restores_dense_numbering() {
        let mut registry = Registry::new();
        registry.resolve("PC");
        let mark = registry.checkpoint();
        registry.resolve("PS4");
        registry.resolve("XONE");

        registry.rollback(mark);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"PS4"), None);
        assert_eq!(registry.resolve("XONE"), (2, true));
    }

    #[test]
    fn test_registry_set_rollback_drops_new_tables() {
        let mut set = RegistrySet::new();
        set.registry_mut("map").resolve(NaturalKey::new(["Bank"]));
        let mark = set.checkpoint();
        set.registry_mut("map").resolve(NaturalKey::new(["Oregon"]));
        set.registry_mut("gamemode").resolve(NaturalKey::new(["Bomb"]));

        set.rollback(&mark);
        assert_eq!(set.len("map"), 1);
        assert_eq!(set.len("gamemode"), 0);
    }
}
