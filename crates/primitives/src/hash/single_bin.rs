//! Whole hash in one map-valued bin
//!
//! Every command, including `hmset`, is one atomic operation on one record.
//! Map keys are codec-encoded field names, so any byte string works as a
//! field. The whole hash must fit the record size limit.

use std::sync::Arc;

use redshim_core::{Error, Operation, RecordStore, Result, Ttl, Value, WritePolicy};
use redshim_engine::codec::{self, Scalar};
use redshim_engine::{parse_integer_text, retry_on_race, RetryConfig};
use tracing::debug;

use super::{HashContents, HashStrategy};
use crate::keyspace::{Keyspace, VALUE_BIN};

/// Hash stored as a map in bin `r`
#[derive(Clone)]
pub struct SingleBinHash {
    store: Arc<dyn RecordStore>,
    keyspace: Keyspace,
    ttl: Ttl,
    retry: RetryConfig,
}

impl SingleBinHash {
    /// Create the strategy; `ttl` is applied by every write
    pub fn new(store: Arc<dyn RecordStore>, keyspace: Keyspace, ttl: Ttl) -> Self {
        Self {
            store,
            keyspace,
            ttl,
            retry: RetryConfig::default(),
        }
    }

    /// Retry budget for promoting decimal-text entries in `hincrby`
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn map_get(field: &[u8]) -> Operation {
        Operation::MapGet {
            bin: VALUE_BIN.to_string(),
            key: codec::encode_text(field),
        }
    }

    fn map_put(field: &[u8], value: &Scalar) -> Operation {
        Operation::MapPut {
            bin: VALUE_BIN.to_string(),
            key: codec::encode_text(field),
            value: codec::encode_scalar(value),
        }
    }

    fn write(&self, key: &[u8], ops: &[Operation]) -> Result<Vec<Value>> {
        self.store.operate(
            &self.keyspace.key(key),
            ops,
            &WritePolicy::new().with_ttl(self.ttl),
        )
    }

    /// Read-only operate; an absent record yields `None`
    fn read(&self, key: &[u8], ops: &[Operation]) -> Result<Option<Vec<Value>>> {
        match self
            .store
            .operate(&self.keyspace.key(key), ops, &WritePolicy::new())
        {
            Ok(results) => Ok(Some(results)),
            Err(Error::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl SingleBinHash {
    /// Rewrite a decimal-text map entry as an integer under a generation
    /// check. Returns false if the entry is missing or not a number.
    fn promote_entry(&self, key: &[u8], field: &[u8]) -> Result<bool> {
        let record_key = self.keyspace.key(key);
        let entry = codec::encode_text(field);
        retry_on_race(&self.retry, || {
            let Some(record) = self.store.get(&record_key, Some(&[VALUE_BIN][..]))? else {
                return Ok(false);
            };
            let number = record
                .bin(VALUE_BIN)
                .and_then(Value::as_map)
                .and_then(|map| map.get(&entry))
                .and_then(parse_integer_text);
            let Some(number) = number else {
                return Ok(false);
            };
            let op = Operation::MapPut {
                bin: VALUE_BIN.to_string(),
                key: entry.clone(),
                value: Value::Int(number),
            };
            let policy = WritePolicy::update_only()
                .with_ttl(Ttl::Unchanged)
                .expect_generation(record.generation);
            self.store.operate(&record_key, &[op], &policy)?;
            debug!(target: "redshim::hash", key = %record_key, number, "map entry promoted to integer");
            Ok(true)
        })
    }
}

fn present(value: &Value) -> Option<Vec<u8>> {
    (!value.is_nil()).then(|| codec::decode(value))
}

impl HashStrategy for SingleBinHash {
    fn name(&self) -> &'static str {
        "single_bin"
    }

    fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &Scalar) -> Result<i64> {
        let results = self.write(key, &[Self::map_get(field), Self::map_put(field, value)])?;
        Ok(i64::from(results.first().map_or(true, Value::is_nil)))
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>> {
        let results = self.read(key, &[Self::map_get(field)])?;
        Ok(results.as_ref().and_then(|r| r.first()).and_then(present))
    }

    fn hdel(&self, key: &[u8], field: &[u8]) -> Result<i64> {
        let op = Operation::MapRemove {
            bin: VALUE_BIN.to_string(),
            key: codec::encode_text(field),
        };
        let policy = WritePolicy::update_only().with_ttl(Ttl::Unchanged);
        match self.store.operate(&self.keyspace.key(key), &[op], &policy) {
            Ok(results) => Ok(i64::from(results.first().is_some_and(|v| !v.is_nil()))),
            Err(Error::RecordNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn hgetall(&self, key: &[u8]) -> Result<HashContents> {
        let record = self.store.get(&self.keyspace.key(key), Some(&[VALUE_BIN][..]))?;
        match record.as_ref().and_then(|r| r.bin(VALUE_BIN)) {
            None | Some(Value::Nil) => Ok(HashContents::new()),
            Some(Value::Map(entries)) => Ok(entries
                .iter()
                .map(|(field, value)| (codec::decode_text(field), codec::decode(value)))
                .collect()),
            Some(other) => Err(Error::BinIncompatibleType {
                bin: VALUE_BIN.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Map increment; a decimal-text entry is first rewritten as an integer
    fn hincrby(&self, key: &[u8], field: &[u8], delta: i64) -> Result<i64> {
        let op = Operation::MapIncrement {
            bin: VALUE_BIN.to_string(),
            key: codec::encode_text(field),
            delta,
        };
        let results = match self.write(key, std::slice::from_ref(&op)) {
            Err(Error::BinIncompatibleType { bin, found }) => {
                if !self.promote_entry(key, field)? {
                    return Err(Error::BinIncompatibleType { bin, found });
                }
                self.write(key, &[op])?
            }
            other => other?,
        };
        results.first().and_then(Value::as_int).ok_or_else(|| {
            Error::InvalidOperation("map increment did not yield an integer".to_string())
        })
    }

    /// One atomic operation for all fields
    fn hmset(&self, key: &[u8], entries: &[(&[u8], Scalar)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let ops: Vec<_> = entries
            .iter()
            .map(|(field, value)| Self::map_put(field, value))
            .collect();
        self.write(key, &ops).map(|_| ())
    }

    /// One atomic read for all fields
    fn hmget(&self, key: &[u8], fields: &[&[u8]]) -> Result<Vec<Option<Vec<u8>>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let ops: Vec<_> = fields.iter().map(|field| Self::map_get(field)).collect();
        Ok(match self.read(key, &ops)? {
            Some(results) => results.iter().map(present).collect(),
            None => vec![None; fields.len()],
        })
    }
}
