//! Secondary bin-equality indices
//!
//! An index is declared on `(namespace, set, bin)`. It maps each distinct
//! value of that bin to the keys of records in the set holding it, so an
//! equality query costs O(matching records) instead of a set scan.
//!
//! Maintenance happens inside the store's write lock: every mutation
//! unindexes the old bins and indexes the new ones.

use redshim_core::{BinMap, RecordKey, Value};
use rustc_hash::{FxHashMap, FxHashSet};

/// Identity of one declared index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexId {
    /// Namespace
    pub namespace: String,
    /// Set
    pub set: String,
    /// Indexed bin
    pub bin: String,
}

impl IndexId {
    /// Create an index identity
    pub fn new(namespace: &str, set: &str, bin: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: set.to_string(),
            bin: bin.to_string(),
        }
    }

    fn covers(&self, key: &RecordKey) -> bool {
        key.in_set(&self.namespace, &self.set)
    }
}

/// All secondary indices of a store
#[derive(Debug, Default)]
pub struct BinIndex {
    indexes: FxHashMap<IndexId, FxHashMap<Value, FxHashSet<RecordKey>>>,
}

impl BinIndex {
    /// Create an empty index registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an index; returns false if it already existed
    pub fn declare(&mut self, id: IndexId) -> bool {
        if self.indexes.contains_key(&id) {
            return false;
        }
        self.indexes.insert(id, FxHashMap::default());
        true
    }

    /// Whether an index exists
    pub fn contains(&self, id: &IndexId) -> bool {
        self.indexes.contains_key(id)
    }

    /// Index the bins of a record under every matching declared index
    pub fn insert(&mut self, key: &RecordKey, bins: &BinMap) {
        for (id, entries) in self.indexes.iter_mut() {
            if !id.covers(key) {
                continue;
            }
            if let Some(value) = bins.get(&id.bin) {
                entries.entry(value.clone()).or_default().insert(key.clone());
            }
        }
    }

    /// Remove the bins of a record from every matching declared index
    pub fn remove(&mut self, key: &RecordKey, bins: &BinMap) {
        for (id, entries) in self.indexes.iter_mut() {
            if !id.covers(key) {
                continue;
            }
            if let Some(value) = bins.get(&id.bin) {
                if let Some(keys) = entries.get_mut(value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        entries.remove(value);
                    }
                }
            }
        }
    }

    /// Keys whose indexed bin equals `value`; `None` if no such index
    pub fn lookup(&self, id: &IndexId, value: &Value) -> Option<Vec<RecordKey>> {
        let entries = self.indexes.get(id)?;
        Some(
            entries
                .get(value)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default(),
        )
    }
}
