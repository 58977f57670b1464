//! Hashes: one contract, three record layouts
//!
//! | Strategy | Layout | Limits |
//! |----------|--------|--------|
//! | [`DirectHash`] | one bin per field in the plain record | field names must be valid bin names |
//! | [`SingleBinHash`] | one map in bin `r` | whole hash bounded by the record size |
//! | [`ExpandedMapHash`] | root record + one record per field | none beyond one field per record |
//!
//! The strategy is picked once, from `hash_strategy` in the config, by
//! [`build_hash_strategy`]. Callers only see `dyn HashStrategy`.
//!
//! Multi-field writes (`hmset`, `batch`) are sequences of independent
//! single-record operations unless a strategy can do better; a failure
//! returns the error with the earlier fields already written.

use std::collections::BTreeMap;
use std::sync::Arc;

use redshim_core::{Error, RecordStore, Result, Ttl};
use redshim_engine::codec::Scalar;
use redshim_engine::{HashStrategyKind, ShimConfig};

use crate::keyspace::{self, Keyspace, TtlStatus};

mod direct;
mod expanded;
mod single_bin;

pub use direct::DirectHash;
pub use expanded::{ExpandedMapHash, RootState};
pub use single_bin::SingleBinHash;

/// Decoded hash contents, field → value
pub type HashContents = BTreeMap<Vec<u8>, Vec<u8>>;

/// Several field increments plus an optional TTL, applied to one hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashBatch {
    /// `(field, delta)` pairs, applied in order
    pub increments: Vec<(Vec<u8>, i64)>,
    /// New TTL in seconds for the whole hash; 0 = never expire
    pub ttl_secs: Option<u32>,
}

impl HashBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field increment
    pub fn incr(mut self, field: impl AsRef<[u8]>, delta: i64) -> Self {
        self.increments.push((field.as_ref().to_vec(), delta));
        self
    }

    /// Set the hash TTL
    pub fn expire(mut self, ttl_secs: u32) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    /// Requested TTL as a write TTL
    pub fn ttl(&self) -> Option<Ttl> {
        self.ttl_secs.map(|secs| match secs {
            0 => Ttl::Never,
            secs => Ttl::Seconds(secs),
        })
    }
}

/// The hash command contract
///
/// Every method takes the logical key. Missing keys and fields are never
/// errors: reads yield `None` or an empty map, deletions yield 0.
pub trait HashStrategy: Send + Sync {
    /// Strategy name as spelled in the config
    fn name(&self) -> &'static str;

    /// Backing record store
    fn store(&self) -> &dyn RecordStore;

    /// Keyspace the plain records live in
    fn keyspace(&self) -> &Keyspace;

    /// Set a field; returns 1 if the field is new, 0 if overwritten
    fn hset(&self, key: &[u8], field: &[u8], value: &Scalar) -> Result<i64>;

    /// Value of a field
    fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Delete a field; returns 1 if it existed
    fn hdel(&self, key: &[u8], field: &[u8]) -> Result<i64>;

    /// Every field and value
    fn hgetall(&self, key: &[u8]) -> Result<HashContents>;

    /// Add to an integer field, creating it at `delta`; returns the new value
    ///
    /// A field holding decimal text such as `"10"` is rewritten as an
    /// integer first. Any other non-integer value is `BinIncompatibleType`.
    fn hincrby(&self, key: &[u8], field: &[u8], delta: i64) -> Result<i64>;

    /// `hincrby` that also sets the hash TTL; 0 = never expire
    fn hincrby_ex(&self, key: &[u8], field: &[u8], delta: i64, ttl_secs: u32) -> Result<i64> {
        let values = self.batch(key, &HashBatch::new().incr(field, delta).expire(ttl_secs))?;
        values
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidOperation("increment batch yielded no value".to_string()))
    }

    /// Set several fields, in order
    fn hmset(&self, key: &[u8], entries: &[(&[u8], Scalar)]) -> Result<()> {
        for (field, value) in entries {
            self.hset(key, field, value)?;
        }
        Ok(())
    }

    /// Values of several fields, in request order
    fn hmget(&self, key: &[u8], fields: &[&[u8]]) -> Result<Vec<Option<Vec<u8>>>> {
        fields.iter().map(|field| self.hget(key, field)).collect()
    }

    /// Delete the whole key; returns whether anything was deleted
    fn delete(&self, key: &[u8]) -> Result<bool> {
        self.store().remove(&self.keyspace().key(key))
    }

    /// Remaining lifetime of the key
    fn ttl(&self, key: &[u8]) -> Result<TtlStatus> {
        keyspace::ttl_of(self.store(), &self.keyspace().key(key))
    }

    /// Set the key's TTL; 0 deletes it. Returns whether the key existed.
    fn set_timeout(&self, key: &[u8], ttl_secs: u32) -> Result<bool> {
        keyspace::expire(self.store(), &self.keyspace().key(key), ttl_secs)
    }

    /// Apply a batch of increments, then the TTL; returns the new values
    fn batch(&self, key: &[u8], batch: &HashBatch) -> Result<Vec<i64>> {
        let mut values = Vec::with_capacity(batch.increments.len());
        for (field, delta) in &batch.increments {
            values.push(self.hincrby(key, field, *delta)?);
        }
        if let Some(ttl) = batch.ttl() {
            self.store().touch(&self.keyspace().key(key), ttl)?;
        }
        Ok(values)
    }
}

/// Build the hash strategy named by `config.hash_strategy`
///
/// # Errors
///
/// Returns an error for an unknown strategy name, or if the expanded
/// strategy cannot create its secondary index.
pub fn build_hash_strategy(
    store: Arc<dyn RecordStore>,
    config: &ShimConfig,
) -> Result<Arc<dyn HashStrategy>> {
    let keyspace = Keyspace::from_config(config);
    Ok(match config.hash_strategy_kind()? {
        HashStrategyKind::Direct => Arc::new(
            DirectHash::new(store, keyspace, config.hash_ttl()).with_retry(config.retry),
        ),
        HashStrategyKind::SingleBin => Arc::new(
            SingleBinHash::new(store, keyspace, config.hash_ttl()).with_retry(config.retry),
        ),
        HashStrategyKind::Expanded => Arc::new(ExpandedMapHash::new(store, keyspace, config)?),
    })
}
