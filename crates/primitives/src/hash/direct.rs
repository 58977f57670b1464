//! One bin per field in the plain record
//!
//! Cheapest layout: every command is a single-record operation. Only works
//! while field names are valid bin names (UTF-8, at most 15 bytes) and the
//! field set stays small.

use std::sync::Arc;

use redshim_core::{Error, Operation, RecordStore, Result, Ttl, Value, WritePolicy};
use redshim_engine::codec::{self, Scalar};
use redshim_engine::{increment_numeric, Increment, RetryConfig};

use super::{HashContents, HashStrategy};
use crate::keyspace::Keyspace;

/// Hash stored as one bin per field
#[derive(Clone)]
pub struct DirectHash {
    store: Arc<dyn RecordStore>,
    keyspace: Keyspace,
    ttl: Ttl,
    retry: RetryConfig,
}

impl DirectHash {
    /// Create the strategy; `ttl` is applied by every write
    pub fn new(store: Arc<dyn RecordStore>, keyspace: Keyspace, ttl: Ttl) -> Self {
        Self {
            store,
            keyspace,
            ttl,
            retry: RetryConfig::default(),
        }
    }

    /// Retry budget for promoting decimal-text fields in `hincrby`
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Field name as a bin name
fn bin_name(field: &[u8]) -> Result<&str> {
    std::str::from_utf8(field)
        .map_err(|_| Error::InvalidBinName(String::from_utf8_lossy(field).into_owned()))
}

impl HashStrategy for DirectHash {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &Scalar) -> Result<i64> {
        let bin = bin_name(field)?;
        let ops = [
            Operation::read(bin),
            Operation::write(bin, codec::encode_scalar(value)),
        ];
        let results = self.store.operate(
            &self.keyspace.key(key),
            &ops,
            &WritePolicy::new().with_ttl(self.ttl),
        )?;
        Ok(i64::from(results.first().map_or(true, Value::is_nil)))
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>> {
        let bin = bin_name(field)?;
        let record = self.store.get(&self.keyspace.key(key), Some(&[bin][..]))?;
        Ok(record
            .as_ref()
            .and_then(|r| r.bin(bin))
            .filter(|v| !v.is_nil())
            .map(codec::decode))
    }

    fn hdel(&self, key: &[u8], field: &[u8]) -> Result<i64> {
        let bin = bin_name(field)?;
        let ops = [Operation::read(bin), Operation::write(bin, Value::Nil)];
        let policy = WritePolicy::update_only().with_ttl(Ttl::Unchanged);
        match self.store.operate(&self.keyspace.key(key), &ops, &policy) {
            Ok(results) => Ok(i64::from(results.first().is_some_and(|v| !v.is_nil()))),
            Err(Error::RecordNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn hgetall(&self, key: &[u8]) -> Result<HashContents> {
        let Some(record) = self.store.get(&self.keyspace.key(key), None)? else {
            return Ok(HashContents::new());
        };
        Ok(record
            .bins
            .iter()
            .map(|(bin, value)| (bin.as_bytes().to_vec(), codec::decode(value)))
            .collect())
    }

    fn hincrby(&self, key: &[u8], field: &[u8], delta: i64) -> Result<i64> {
        let bin = bin_name(field)?;
        let record_key = self.keyspace.key(key);
        increment_numeric(
            self.store.as_ref(),
            &Increment::new(&record_key, bin, delta).with_ttl(self.ttl),
            &self.retry,
        )
    }
}
