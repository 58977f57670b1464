//! Strings: binary-safe values with TTL, and counters
//!
//! A string lives in bin `r` of the plain record for its key. Values go
//! through the codec, so any byte string round-trips. Integers written as
//! `Scalar::Int` are stored natively, which keeps `incr` working on them.
//!
//! ## TTL
//!
//! - `set` always clears the TTL (a plain SET makes the key persistent)
//! - `setex` / `setnxex` set it
//! - `incr` and friends keep whatever TTL the key already has

use std::sync::Arc;

use redshim_core::{BinMap, Error, RecordStore, Result, Ttl, Value, WritePolicy};
use redshim_engine::codec::{self, Scalar};
use redshim_engine::{increment_numeric, Increment, RetryConfig};

use crate::keyspace::{self, Keyspace, TtlStatus, VALUE_BIN};

/// String and counter commands
#[derive(Clone)]
pub struct Strings {
    store: Arc<dyn RecordStore>,
    keyspace: Keyspace,
    retry: RetryConfig,
}

impl Strings {
    /// Create a strings facade
    pub fn new(store: Arc<dyn RecordStore>, keyspace: Keyspace, retry: RetryConfig) -> Self {
        Self {
            store,
            keyspace,
            retry,
        }
    }

    /// Value of a key, or `None` if absent
    ///
    /// # Errors
    ///
    /// `BinIncompatibleType` if the key holds a list or a hash.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let record = self.store.get(&self.keyspace.key(key), Some(&[VALUE_BIN][..]))?;
        match record.as_ref().and_then(|r| r.bin(VALUE_BIN)) {
            None | Some(Value::Nil) => Ok(None),
            Some(v @ (Value::Str(_) | Value::Int(_))) => Ok(Some(codec::decode(v))),
            Some(other) => Err(Error::BinIncompatibleType {
                bin: VALUE_BIN.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Set a key, replacing any previous value and clearing its TTL
    pub fn set(&self, key: &[u8], value: &Scalar) -> Result<()> {
        self.write(key, value, WritePolicy::replace().with_ttl(Ttl::Never))
    }

    /// Set a key with a TTL in seconds
    pub fn setex(&self, key: &[u8], ttl_secs: u32, value: &Scalar) -> Result<()> {
        check_ttl(ttl_secs)?;
        self.write(key, value, WritePolicy::replace().with_ttl(Ttl::Seconds(ttl_secs)))
    }

    /// Set a key only if absent; returns whether it was set
    pub fn setnx(&self, key: &[u8], value: &Scalar) -> Result<bool> {
        self.write_if_absent(key, value, Ttl::Never)
    }

    /// Set a key with a TTL only if absent; returns whether it was set
    pub fn setnxex(&self, key: &[u8], ttl_secs: u32, value: &Scalar) -> Result<bool> {
        check_ttl(ttl_secs)?;
        self.write_if_absent(key, value, Ttl::Seconds(ttl_secs))
    }

    /// Delete the plain record of a key; returns whether it existed
    pub fn del(&self, key: &[u8]) -> Result<bool> {
        self.store.remove(&self.keyspace.key(key))
    }

    /// Remaining lifetime of a key
    pub fn ttl(&self, key: &[u8]) -> Result<TtlStatus> {
        keyspace::ttl_of(self.store.as_ref(), &self.keyspace.key(key))
    }

    /// Set a key's TTL; 0 deletes it. Returns whether the key existed.
    pub fn set_timeout(&self, key: &[u8], ttl_secs: u32) -> Result<bool> {
        keyspace::expire(self.store.as_ref(), &self.keyspace.key(key), ttl_secs)
    }

    /// Add 1
    pub fn incr(&self, key: &[u8]) -> Result<i64> {
        self.incrby(key, 1)
    }

    /// Subtract 1
    pub fn decr(&self, key: &[u8]) -> Result<i64> {
        self.incrby(key, -1)
    }

    /// Subtract `delta`
    pub fn decrby(&self, key: &[u8], delta: i64) -> Result<i64> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| Error::invalid_input("decrement is out of range"))?;
        self.incrby(key, delta)
    }

    /// Add `delta`, creating the key at `delta` if absent
    ///
    /// A value stored as decimal text (e.g. written as bytes `"12"`) is
    /// converted to a native integer first, as the reference store treats
    /// every string that parses as an integer as a counter.
    ///
    /// # Errors
    ///
    /// `BinIncompatibleType` if the key holds a non-numeric value.
    pub fn incrby(&self, key: &[u8], delta: i64) -> Result<i64> {
        let record_key = self.keyspace.key(key);
        increment_numeric(
            self.store.as_ref(),
            &Increment::new(&record_key, VALUE_BIN, delta),
            &self.retry,
        )
    }

    /// Remove every record in the keyspace's sets; returns how many went
    pub fn flushdb(&self) -> Result<usize> {
        let mut removed = 0;
        for set in self.keyspace.all_sets() {
            for key in self.store.scan(self.keyspace.namespace(), &set)? {
                if self.store.remove(&key)? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn write(&self, key: &[u8], value: &Scalar, policy: WritePolicy) -> Result<()> {
        self.store
            .put(&self.keyspace.key(key), value_bins(value), &policy)
    }

    fn write_if_absent(&self, key: &[u8], value: &Scalar, ttl: Ttl) -> Result<bool> {
        let policy = WritePolicy::create_only().with_ttl(ttl);
        match self.write(key, value, policy) {
            Ok(()) => Ok(true),
            Err(Error::RecordExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn value_bins(value: &Scalar) -> BinMap {
    let mut bins = BinMap::new();
    bins.insert(VALUE_BIN.to_string(), codec::encode_scalar(value));
    bins
}

fn check_ttl(ttl_secs: u32) -> Result<()> {
    if ttl_secs == 0 {
        return Err(Error::invalid_input("invalid expire time"));
    }
    Ok(())
}
