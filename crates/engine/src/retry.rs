//! Optimistic-concurrency retry primitives
//!
//! Two loops live here:
//!
//! - [`increment_or_create`]: "add N to bin F and read it back" on a record
//!   that may not exist yet. Concurrent first writers race on create-only;
//!   the loser goes back to incrementing the record the winner created.
//! - [`retry_on_race`]: re-run a read-modify-write closure while it loses
//!   generation or create-only races, with exponential backoff.
//!
//! [`increment_numeric`] combines them for counters that may hold decimal
//! text.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use redshim_core::{
    BinMap, Error, Operation, RecordKey, RecordStore, Result, Ttl, Value, WritePolicy,
};

/// Configuration for bounded retry loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 2,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Re-run `f` while it loses an optimistic-concurrency race
///
/// The closure is called until either:
/// - it succeeds
/// - it fails with a non-race error (not retried)
/// - `config.max_retries` retries are exhausted (the last race error is returned)
pub fn retry_on_race<T, F>(config: &RetryConfig, mut f: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_race() && attempt < config.max_retries => {
                let delay = config.calculate_delay(attempt);
                debug!(target: "redshim::retry", attempt, delay_ms = delay.as_millis() as u64, error = %e, "race lost; retrying");
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// One increment-or-create request
///
/// `companions` are rewritten next to the counter on every attempt (so a
/// record stays discoverable by its indexed bins); `on_create` bins are only
/// written by the create path.
#[derive(Debug, Clone)]
pub struct Increment<'a> {
    /// Record holding the counter
    pub key: &'a RecordKey,
    /// Counter bin
    pub bin: &'a str,
    /// Signed increment
    pub delta: i64,
    /// TTL applied by the write (`Ttl::Unchanged` keeps the current expiry)
    pub ttl: Ttl,
    /// Bins written alongside every increment
    pub companions: BinMap,
    /// Bins written only when the record is created
    pub on_create: BinMap,
}

impl<'a> Increment<'a> {
    /// Increment `bin` of `key` by `delta`, keeping the current TTL
    pub fn new(key: &'a RecordKey, bin: &'a str, delta: i64) -> Self {
        Self {
            key,
            bin,
            delta,
            ttl: Ttl::Unchanged,
            companions: BinMap::new(),
            on_create: BinMap::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Write a companion bin on every attempt
    pub fn with_companion(mut self, bin: impl Into<String>, value: impl Into<Value>) -> Self {
        self.companions.insert(bin.into(), value.into());
        self
    }

    /// Write a bin only when creating the record
    pub fn with_on_create(mut self, bin: impl Into<String>, value: impl Into<Value>) -> Self {
        self.on_create.insert(bin.into(), value.into());
        self
    }

    fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.companions.len() + 2);
        ops.push(Operation::add(self.bin, self.delta));
        ops.extend(
            self.companions
                .iter()
                .map(|(bin, value)| Operation::write(bin.as_str(), value.clone())),
        );
        ops.push(Operation::read(self.bin));
        ops
    }

    fn initial_bins(&self) -> BinMap {
        let mut bins = self.on_create.clone();
        bins.extend(self.companions.clone());
        bins.insert(self.bin.to_string(), Value::Int(self.delta));
        bins
    }
}

/// Atomically add to a counter bin, creating the record if absent
///
/// 1. Update-only `operate`: add, rewrite companions, read back.
/// 2. `BinIncompatibleType` (the bin isn't numeric) is returned unchanged.
/// 3. `RecordNotFound`: create-only `put` of the initial bins.
///    - success: the counter equals `delta`
///    - `RecordExists`: a concurrent writer created it first; go to 1
/// 4. Any other error is returned unchanged.
///
/// The loop is unbounded but terminates: a lost create means the record
/// now exists, so the next increment can only miss if someone deleted it
/// in between.
pub fn increment_or_create<S: RecordStore + ?Sized>(store: &S, inc: &Increment<'_>) -> Result<i64> {
    let ops = inc.operations();
    let update = WritePolicy::update_only().with_ttl(inc.ttl);
    let create = WritePolicy::create_only().with_ttl(inc.ttl);

    let mut attempt: u32 = 0;
    loop {
        match store.operate(inc.key, &ops, &update) {
            Ok(results) => {
                return results.last().and_then(Value::as_int).ok_or_else(|| {
                    Error::InvalidOperation(format!(
                        "increment of bin '{}' did not read back an integer",
                        inc.bin
                    ))
                })
            }
            Err(Error::RecordNotFound(_)) => match store.put(inc.key, inc.initial_bins(), &create) {
                Ok(()) => return Ok(inc.delta),
                Err(Error::RecordExists(_)) => {
                    attempt += 1;
                    debug!(target: "redshim::retry", key = %inc.key, bin = inc.bin, attempt, "create race lost; retrying increment");
                }
                Err(e) => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}

/// [`increment_or_create`], treating a decimal-text counter as an integer
///
/// The reference store counts on any string that parses as an integer. If
/// the increment hits a text bin, the text is rewritten as `Value::Int`
/// under a generation check ([`promote_numeric_text`]) and the increment
/// runs again. Non-numeric text keeps the `BinIncompatibleType` error.
pub fn increment_numeric<S: RecordStore + ?Sized>(
    store: &S,
    inc: &Increment<'_>,
    retry: &RetryConfig,
) -> Result<i64> {
    match increment_or_create(store, inc) {
        Err(Error::BinIncompatibleType { bin, found }) => {
            if promote_numeric_text(store, inc.key, inc.bin, retry)? {
                increment_or_create(store, inc)
            } else {
                Err(Error::BinIncompatibleType { bin, found })
            }
        }
        other => other,
    }
}

/// Rewrite a decimal-text bin as an integer
///
/// Returns `false` (and writes nothing) if the record is gone or the bin
/// does not hold integer text. Lost generation races are retried per
/// `retry`.
pub fn promote_numeric_text<S: RecordStore + ?Sized>(
    store: &S,
    key: &RecordKey,
    bin: &str,
    retry: &RetryConfig,
) -> Result<bool> {
    retry_on_race(retry, || {
        let Some(record) = store.get(key, Some(&[bin][..]))? else {
            return Ok(false);
        };
        let Some(number) = record.bin(bin).and_then(parse_integer_text) else {
            return Ok(false);
        };
        let mut bins = BinMap::new();
        bins.insert(bin.to_string(), Value::Int(number));
        let policy = WritePolicy::update_only()
            .with_ttl(Ttl::Unchanged)
            .expect_generation(record.generation);
        store.put(key, bins, &policy)?;
        debug!(target: "redshim::retry", key = %key, bin, number, "numeric text promoted");
        Ok(true)
    })
}

/// Integer held as text, if the value is one
pub fn parse_integer_text(value: &Value) -> Option<i64> {
    value.as_str().and_then(|text| text.parse::<i64>().ok())
}
