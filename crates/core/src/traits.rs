//! Record store abstraction
//!
//! [`RecordStore`] is the adapter contract every upper layer consumes. An
//! implementation must make each single call linearizable for the record it
//! addresses; nothing is promised across records. The emulation layers
//! build multi-record semantics purely by composing these calls.

use crate::error::Result;
use crate::key::RecordKey;
use crate::operation::{Filter, Operation};
use crate::policy::{Ttl, WritePolicy};
use crate::record::{Record, RecordMeta};
use crate::value::{BinMap, Value};

/// Atomic per-record database
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait RecordStore: Send + Sync {
    /// Read a record, optionally projecting a subset of bins
    ///
    /// Returns `None` if the record doesn't exist or has expired.
    fn get(&self, key: &RecordKey, bins: Option<&[&str]>) -> Result<Option<Record>>;

    /// Write bins under a write policy
    ///
    /// # Errors
    ///
    /// - `RecordExists` under `CreateOnly` when the record is present
    /// - `RecordNotFound` under `UpdateOnly`/`ReplaceOnly` when absent
    /// - `GenerationMismatch` when an expected generation doesn't match
    /// - `RecordTooBig` / `InvalidBinName` on limit violations
    fn put(&self, key: &RecordKey, bins: BinMap, policy: &WritePolicy) -> Result<()>;

    /// Remove a record; returns whether it existed
    fn remove(&self, key: &RecordKey) -> Result<bool>;

    /// Reset a record's TTL; returns whether it existed
    fn touch(&self, key: &RecordKey, ttl: Ttl) -> Result<bool>;

    /// Record metadata without bins
    fn exists(&self, key: &RecordKey) -> Result<Option<RecordMeta>>;

    /// Apply operations atomically to one record
    ///
    /// Results are positional: one `Value` per operation, `Nil` for
    /// write-only steps. A record left without bins is removed.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` for read-only operations, or under an
    ///   `UpdateOnly` policy, when the record is absent
    /// - `BinIncompatibleType` when an operation meets the wrong bin type
    fn operate(
        &self,
        key: &RecordKey,
        ops: &[Operation],
        policy: &WritePolicy,
    ) -> Result<Vec<Value>>;

    /// Create a secondary equality index; returns false if it already existed
    fn create_index(&self, namespace: &str, set: &str, bin: &str) -> Result<bool>;

    /// Records of a set matching an indexed predicate, in no particular order
    ///
    /// # Errors
    ///
    /// `IndexNotFound` if no index exists on the filter's bin.
    fn query(&self, namespace: &str, set: &str, filter: &Filter)
        -> Result<Vec<(RecordKey, Record)>>;

    /// Keys of every live record of a set
    fn scan(&self, namespace: &str, set: &str) -> Result<Vec<RecordKey>>;
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn get(&self, key: &RecordKey, bins: Option<&[&str]>) -> Result<Option<Record>> {
        (**self).get(key, bins)
    }

    fn put(&self, key: &RecordKey, bins: BinMap, policy: &WritePolicy) -> Result<()> {
        (**self).put(key, bins, policy)
    }

    fn remove(&self, key: &RecordKey) -> Result<bool> {
        (**self).remove(key)
    }

    fn touch(&self, key: &RecordKey, ttl: Ttl) -> Result<bool> {
        (**self).touch(key, ttl)
    }

    fn exists(&self, key: &RecordKey) -> Result<Option<RecordMeta>> {
        (**self).exists(key)
    }

    fn operate(
        &self,
        key: &RecordKey,
        ops: &[Operation],
        policy: &WritePolicy,
    ) -> Result<Vec<Value>> {
        (**self).operate(key, ops, policy)
    }

    fn create_index(&self, namespace: &str, set: &str, bin: &str) -> Result<bool> {
        (**self).create_index(namespace, set, bin)
    }

    fn query(
        &self,
        namespace: &str,
        set: &str,
        filter: &Filter,
    ) -> Result<Vec<(RecordKey, Record)>> {
        (**self).query(namespace, set, filter)
    }

    fn scan(&self, namespace: &str, set: &str) -> Result<Vec<RecordKey>> {
        (**self).scan(namespace, set)
    }
}
