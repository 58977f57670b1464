//! Lists over a native list bin
//!
//! A list lives in bin `r` as a `Value::List`. Push and pop map onto single
//! atomic list operations. `lrange` reads the list once and slices it;
//! `ltrim` computes its window from a read and applies it under a
//! generation check, retrying if the list changed in between.
//!
//! Indices follow the reference store: inclusive bounds, negative values
//! count from the end, out-of-range bounds clamp, an inverted range is empty.

use std::sync::Arc;

use tracing::debug;

use redshim_core::{Error, Operation, RecordStore, Result, Ttl, Value, WritePolicy};
use redshim_engine::codec::{self, Scalar};
use redshim_engine::{retry_on_race, RetryConfig};

use crate::keyspace::{Keyspace, VALUE_BIN};

/// Resolve an inclusive `[start, end]` range against a list of `len`
/// elements
///
/// Returns the clamped inclusive bounds, or `None` if the range selects
/// nothing.
///
/// # Examples
///
/// ```
/// use redshim_primitives::resolve_range;
///
/// assert_eq!(resolve_range(-2, 8, 6), Some((4, 5)));
/// assert_eq!(resolve_range(0, -1, 3), Some((0, 2)));
/// assert_eq!(resolve_range(-2, -3, 3), None);
/// ```
pub fn resolve_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let end = if end < 0 { end + len } else { end.min(len - 1) };
    if start > end || start >= len {
        return None;
    }
    Some((start as usize, end as usize))
}

/// List commands
#[derive(Clone)]
pub struct Lists {
    store: Arc<dyn RecordStore>,
    keyspace: Keyspace,
    retry: RetryConfig,
}

impl Lists {
    /// Create a lists facade
    pub fn new(store: Arc<dyn RecordStore>, keyspace: Keyspace, retry: RetryConfig) -> Self {
        Self {
            store,
            keyspace,
            retry,
        }
    }

    /// Append; returns the new length
    pub fn rpush(&self, key: &[u8], value: &Scalar) -> Result<i64> {
        let op = Operation::ListAppend {
            bin: VALUE_BIN.to_string(),
            value: codec::encode_scalar(value),
        };
        self.push(key, op)
    }

    /// Prepend; returns the new length
    pub fn lpush(&self, key: &[u8], value: &Scalar) -> Result<i64> {
        let op = Operation::ListInsert {
            bin: VALUE_BIN.to_string(),
            index: 0,
            value: codec::encode_scalar(value),
        };
        self.push(key, op)
    }

    /// Remove and return the last element
    pub fn rpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.pop(key, -1)
    }

    /// Remove and return the first element
    pub fn lpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.pop(key, 0)
    }

    /// Number of elements (0 if absent)
    pub fn lsize(&self, key: &[u8]) -> Result<i64> {
        let op = Operation::ListSize {
            bin: VALUE_BIN.to_string(),
        };
        match self.operate(key, &[op]) {
            Ok(results) => Ok(first_int(&results)),
            Err(Error::RecordNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Elements in the inclusive range `[start, end]`
    pub fn lrange(&self, key: &[u8], start: i64, end: i64) -> Result<Vec<Vec<u8>>> {
        let items = self.read_list(key)?.map(|(items, _)| items).unwrap_or_default();
        Ok(match resolve_range(start, end, items.len()) {
            Some((first, last)) => items[first..=last].iter().map(codec::decode).collect(),
            None => Vec::new(),
        })
    }

    /// Keep only the inclusive range `[start, end]`; an empty range removes
    /// the list
    ///
    /// # Errors
    ///
    /// `GenerationMismatch` if concurrent writers keep changing the list
    /// for longer than the retry budget.
    pub fn ltrim(&self, key: &[u8], start: i64, end: i64) -> Result<()> {
        let record_key = self.keyspace.key(key);
        let mut attempt = 0u32;
        retry_on_race(&self.retry, || {
            attempt += 1;
            let Some((items, generation)) = self.read_list(key)? else {
                return Ok(());
            };
            let len = items.len();
            let op = match resolve_range(start, end, len) {
                Some((0, last)) if last + 1 == len => return Ok(()),
                Some((first, last)) => Operation::ListTrim {
                    bin: VALUE_BIN.to_string(),
                    start: first,
                    count: last - first + 1,
                },
                None => Operation::write(VALUE_BIN, Value::Nil),
            };
            if attempt > 1 {
                debug!(target: "redshim::list", key = %record_key, attempt, generation, "retrying trim");
            }
            let policy = WritePolicy::update_only()
                .with_ttl(Ttl::Unchanged)
                .expect_generation(generation);
            match self.store.operate(&record_key, &[op], &policy) {
                Ok(_) | Err(Error::RecordNotFound(_)) => Ok(()),
                Err(e) => Err(e),
            }
        })
    }

    fn push(&self, key: &[u8], op: Operation) -> Result<i64> {
        let results = self.store.operate(
            &self.keyspace.key(key),
            &[op],
            &WritePolicy::new().with_ttl(Ttl::Unchanged),
        )?;
        Ok(first_int(&results))
    }

    fn pop(&self, key: &[u8], index: i64) -> Result<Option<Vec<u8>>> {
        let op = Operation::ListPop {
            bin: VALUE_BIN.to_string(),
            index,
        };
        match self.operate(key, &[op]) {
            Ok(results) => Ok(results
                .first()
                .filter(|v| !v.is_nil())
                .map(codec::decode)),
            Err(Error::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Operate on an existing record, keeping its TTL
    fn operate(&self, key: &[u8], ops: &[Operation]) -> Result<Vec<Value>> {
        self.store.operate(
            &self.keyspace.key(key),
            ops,
            &WritePolicy::update_only().with_ttl(Ttl::Unchanged),
        )
    }

    /// The list and the generation it was read at
    fn read_list(&self, key: &[u8]) -> Result<Option<(Vec<Value>, u32)>> {
        let Some(mut record) = self
            .store
            .get(&self.keyspace.key(key), Some(&[VALUE_BIN][..]))?
        else {
            return Ok(None);
        };
        match record.take_bin(VALUE_BIN) {
            Value::List(items) => Ok(Some((items, record.generation))),
            Value::Nil => Ok(None),
            other => Err(Error::BinIncompatibleType {
                bin: VALUE_BIN.to_string(),
                found: other.type_name(),
            }),
        }
    }
}

fn first_int(results: &[Value]) -> i64 {
    results.first().and_then(Value::as_int).unwrap_or(0)
}
