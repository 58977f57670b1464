//! MemoryRecordStore: in-process record store with BTreeMap and generations
//!
//! This module implements the RecordStore trait using:
//! - `BTreeMap<RecordKey, StoredRecord>` for ordered storage (sets are contiguous)
//! - `parking_lot::RwLock` for thread-safe access
//! - Per-record generation counters for optimistic concurrency
//! - A TTL index and secondary bin-equality indices
//!
//! # Design Notes
//!
//! - **One write lock per mutating call**: every single-record call is
//!   linearizable; nothing spans records
//! - **Logical TTL expiration**: expired records are filtered at read time
//!   and reaped by `TTLCleaner`
//! - **Lock order**: data → bin index → TTL index, always

use std::collections::BTreeMap;

use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::debug;

use redshim_core::{
    BinMap, Error, Filter, GenerationPolicy, Limits, Operation, Record, RecordExistsAction,
    RecordKey, RecordMeta, RecordStore, Result, Timestamp, Ttl, Value, WritePolicy,
};

use crate::config::StoreConfig;
use crate::index::{BinIndex, IndexId};
use crate::ops;
use crate::stored_record::{next_generation, StoredRecord};
use crate::ttl::TTLIndex;

/// In-memory record store
///
/// All indices are updated atomically with the main data map within the
/// same write lock acquisition.
#[derive(Debug)]
pub struct MemoryRecordStore {
    /// Main data map
    data: RwLock<BTreeMap<RecordKey, StoredRecord>>,
    /// Secondary index: (namespace, set, bin) → value → keys
    bin_index: RwLock<BinIndex>,
    /// TTL index: deadline → keys, for cleanup
    ttl_index: RwLock<TTLIndex>,
    /// Default TTL and limits
    config: StoreConfig,
}

/// Write guards over every table, acquired in lock order
struct Tables<'a> {
    data: RwLockWriteGuard<'a, BTreeMap<RecordKey, StoredRecord>>,
    bin_index: RwLockWriteGuard<'a, BinIndex>,
    ttl_index: RwLockWriteGuard<'a, TTLIndex>,
}

impl Tables<'_> {
    fn live(&self, key: &RecordKey, now: Timestamp) -> Option<&StoredRecord> {
        self.data.get(key).filter(|r| !r.is_expired_at(now))
    }

    fn unindex(&mut self, key: &RecordKey, old: &StoredRecord) {
        self.bin_index.remove(key, old.bins());
        if let Some(deadline) = old.expires_at() {
            self.ttl_index.remove(deadline, key);
        }
    }

    fn store(&mut self, key: &RecordKey, record: StoredRecord) {
        if let Some(old) = self.data.remove(key) {
            self.unindex(key, &old);
        }
        self.bin_index.insert(key, record.bins());
        if let Some(deadline) = record.expires_at() {
            self.ttl_index.insert(deadline, key.clone());
        }
        self.data.insert(key.clone(), record);
    }

    fn delete(&mut self, key: &RecordKey) -> Option<StoredRecord> {
        let old = self.data.remove(key)?;
        self.unindex(key, &old);
        Some(old)
    }
}

impl MemoryRecordStore {
    /// Create a store with default configuration (no default TTL)
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with explicit configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            bin_index: RwLock::new(BinIndex::new()),
            ttl_index: RwLock::new(TTLIndex::new()),
            config,
        }
    }

    /// Active limits
    pub fn limits(&self) -> &Limits {
        &self.config.limits
    }

    /// Number of live records across all namespaces and sets
    pub fn len(&self) -> usize {
        let now = Timestamp::now();
        self.data
            .read()
            .values()
            .filter(|r| !r.is_expired_at(now))
            .count()
    }

    /// Whether the store holds no live record
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every record whose deadline has passed
    ///
    /// Uses the TTL index: O(expired count), not O(total data). Returns
    /// the number of records removed.
    pub fn purge_expired(&self) -> usize {
        let now = Timestamp::now();
        let mut tables = self.lock_tables();
        let candidates = tables.ttl_index.find_expired(now);
        let mut purged = 0;
        for key in candidates {
            let expired = tables
                .data
                .get(&key)
                .map(|r| r.is_expired_at(now))
                .unwrap_or(false);
            if expired && tables.delete(&key).is_some() {
                purged += 1;
            }
        }
        if purged > 0 {
            debug!(target: "redshim::store", purged, "expired records purged");
        }
        purged
    }

    fn lock_tables(&self) -> Tables<'_> {
        let data = self.data.write();
        let bin_index = self.bin_index.write();
        let ttl_index = self.ttl_index.write();
        Tables {
            data,
            bin_index,
            ttl_index,
        }
    }

    fn validate(&self, bins: &BinMap) -> Result<()> {
        self.config.limits.validate_bins(bins)?;
        self.config.limits.validate_record_size(bins)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Existence and generation checks shared by `put` and `operate`
fn check_policy(
    key: &RecordKey,
    existing: Option<&StoredRecord>,
    policy: &WritePolicy,
) -> Result<()> {
    match (policy.exists, existing) {
        (RecordExistsAction::CreateOnly, Some(_)) => {
            return Err(Error::RecordExists(key.clone()))
        }
        (action, None) if action.requires_existing() => {
            return Err(Error::RecordNotFound(key.clone()))
        }
        _ => {}
    }
    if let GenerationPolicy::ExpectEqual(expected) = policy.generation {
        let actual = existing.map(StoredRecord::generation).unwrap_or(0);
        if actual != expected {
            return Err(Error::GenerationMismatch { expected, actual });
        }
    }
    Ok(())
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, key: &RecordKey, bins: Option<&[&str]>) -> Result<Option<Record>> {
        let now = Timestamp::now();
        let data = self.data.read();
        Ok(data
            .get(key)
            .filter(|r| !r.is_expired_at(now))
            .map(|r| r.to_record(bins, now)))
    }

    fn put(&self, key: &RecordKey, bins: BinMap, policy: &WritePolicy) -> Result<()> {
        let now = Timestamp::now();
        let mut tables = self.lock_tables();
        let existing = tables.live(key, now).cloned();
        check_policy(key, existing.as_ref(), policy)?;

        let mut merged = match &existing {
            Some(record) if !policy.exists.replaces() => record.bins().clone(),
            _ => BinMap::new(),
        };
        for (name, value) in bins {
            if value.is_nil() {
                merged.remove(&name);
            } else {
                merged.insert(name, value);
            }
        }

        if merged.is_empty() {
            tables.delete(key);
            return Ok(());
        }
        self.validate(&merged)?;

        let generation = next_generation(existing.as_ref().map_or(0, StoredRecord::generation));
        let expires_at = self.config.deadline(
            policy.ttl,
            existing.as_ref().map(StoredRecord::expires_at),
            now,
        );
        tables.store(key, StoredRecord::new(merged, generation, expires_at));
        Ok(())
    }

    fn remove(&self, key: &RecordKey) -> Result<bool> {
        let now = Timestamp::now();
        let mut tables = self.lock_tables();
        Ok(tables
            .delete(key)
            .map(|old| !old.is_expired_at(now))
            .unwrap_or(false))
    }

    fn touch(&self, key: &RecordKey, ttl: Ttl) -> Result<bool> {
        let now = Timestamp::now();
        let mut tables = self.lock_tables();
        let Some(existing) = tables.live(key, now).cloned() else {
            return Ok(false);
        };
        let expires_at = self
            .config
            .deadline(ttl, Some(existing.expires_at()), now);
        let touched = StoredRecord::new(
            existing.bins().clone(),
            next_generation(existing.generation()),
            expires_at,
        );
        tables.store(key, touched);
        Ok(true)
    }

    fn exists(&self, key: &RecordKey) -> Result<Option<RecordMeta>> {
        let now = Timestamp::now();
        let data = self.data.read();
        Ok(data
            .get(key)
            .filter(|r| !r.is_expired_at(now))
            .map(|r| r.meta(now)))
    }

    fn operate(
        &self,
        key: &RecordKey,
        operations: &[Operation],
        policy: &WritePolicy,
    ) -> Result<Vec<Value>> {
        let now = Timestamp::now();
        let mut tables = self.lock_tables();
        let existing = tables.live(key, now).cloned();

        let writes = operations.iter().any(Operation::is_write);
        let creates = operations
            .iter()
            .any(|op| op.is_write() && !matches!(op, Operation::Touch));
        if existing.is_none() && !creates {
            return Err(Error::RecordNotFound(key.clone()));
        }
        check_policy(key, existing.as_ref(), policy)?;

        let mut bins = existing
            .as_ref()
            .map(|r| r.bins().clone())
            .unwrap_or_default();
        let results = operations
            .iter()
            .map(|op| ops::apply(&mut bins, op))
            .collect::<Result<Vec<_>>>()?;

        if !writes {
            return Ok(results);
        }
        if bins.is_empty() {
            tables.delete(key);
            return Ok(results);
        }
        self.validate(&bins)?;

        let generation = next_generation(existing.as_ref().map_or(0, StoredRecord::generation));
        let expires_at = self.config.deadline(
            policy.ttl,
            existing.as_ref().map(StoredRecord::expires_at),
            now,
        );
        tables.store(key, StoredRecord::new(bins, generation, expires_at));
        Ok(results)
    }

    fn create_index(&self, namespace: &str, set: &str, bin: &str) -> Result<bool> {
        self.config.limits.validate_bin_name(bin)?;
        let data = self.data.read();
        let mut bin_index = self.bin_index.write();

        let id = IndexId::new(namespace, set, bin);
        if !bin_index.declare(id) {
            return Ok(false);
        }
        let start = RecordKey::new(namespace, set, b"");
        for (key, record) in data.range(start..).take_while(|(k, _)| k.in_set(namespace, set)) {
            bin_index.insert(key, record.bins());
        }
        debug!(target: "redshim::store", namespace, set, bin, "secondary index created");
        Ok(true)
    }

    fn query(
        &self,
        namespace: &str,
        set: &str,
        filter: &Filter,
    ) -> Result<Vec<(RecordKey, Record)>> {
        let now = Timestamp::now();
        let data = self.data.read();
        let bin_index = self.bin_index.read();

        let Filter::Equal { bin, value } = filter;
        let id = IndexId::new(namespace, set, bin);
        let mut keys = bin_index
            .lookup(&id, value)
            .ok_or_else(|| Error::IndexNotFound {
                namespace: namespace.to_string(),
                set: set.to_string(),
                bin: bin.clone(),
            })?;
        keys.sort();

        Ok(keys
            .into_iter()
            .filter_map(|key| {
                let record = data.get(&key).filter(|r| !r.is_expired_at(now))?;
                let view = record.to_record(None, now);
                Some((key, view))
            })
            .collect())
    }

    fn scan(&self, namespace: &str, set: &str) -> Result<Vec<RecordKey>> {
        let now = Timestamp::now();
        let data = self.data.read();
        let start = RecordKey::new(namespace, set, b"");
        Ok(data
            .range(start..)
            .take_while(|(k, _)| k.in_set(namespace, set))
            .filter(|(_, r)| !r.is_expired_at(now))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
