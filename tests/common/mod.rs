//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use redshim::{Client, Error, MemoryRecordStore, RecordStore, Result, ShimConfig};
use redshim_core::{
    BinMap, Filter, GenerationPolicy, Operation, Record, RecordKey, RecordMeta, Ttl, Value,
    WritePolicy,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Hash strategy names, as spelled in the config.
pub const STRATEGIES: [&str; 3] = ["expanded", "single_bin", "direct"];

/// Config with the given hash strategy and a short root backoff.
pub fn config_for(strategy: &str) -> ShimConfig {
    ShimConfig {
        hash_strategy: strategy.to_string(),
        root_backoff_ms: 5,
        ..ShimConfig::default()
    }
}

/// Fresh in-memory client with the default (expanded) hash strategy.
pub fn client() -> Client {
    init_tracing();
    Client::in_memory(&config_for("expanded")).unwrap()
}

/// One fresh client per hash strategy.
pub fn clients_per_strategy() -> Vec<(&'static str, Client)> {
    init_tracing();
    STRATEGIES
        .iter()
        .map(|name| (*name, Client::in_memory(&config_for(name)).unwrap()))
        .collect()
}

// ============================================================================
// ContendedStore - injects a competing write before guarded writes
// ============================================================================

/// Record store that loses the first `conflicts` generation-guarded writes.
///
/// Before delegating a write that expects a generation, it touches the
/// record (bumping its generation) as a concurrent writer would, so the
/// guarded write fails with `GenerationMismatch` and the caller must retry.
pub struct ContendedStore {
    inner: MemoryRecordStore,
    conflicts: AtomicUsize,
    injected: AtomicUsize,
}

impl ContendedStore {
    pub fn new(conflicts: usize) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            conflicts: AtomicUsize::new(conflicts),
            injected: AtomicUsize::new(0),
        }
    }

    /// Number of competing writes injected so far
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn interfere(&self, key: &RecordKey, policy: &WritePolicy) -> Result<()> {
        if !matches!(policy.generation, GenerationPolicy::ExpectEqual(_)) {
            return Ok(());
        }
        let remaining = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            self.inner.touch(key, Ttl::Unchanged)?;
            self.injected.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl RecordStore for ContendedStore {
    fn get(&self, key: &RecordKey, bins: Option<&[&str]>) -> Result<Option<Record>> {
        self.inner.get(key, bins)
    }

    fn put(&self, key: &RecordKey, bins: BinMap, policy: &WritePolicy) -> Result<()> {
        self.interfere(key, policy)?;
        self.inner.put(key, bins, policy)
    }

    fn remove(&self, key: &RecordKey) -> Result<bool> {
        self.inner.remove(key)
    }

    fn touch(&self, key: &RecordKey, ttl: Ttl) -> Result<bool> {
        self.inner.touch(key, ttl)
    }

    fn exists(&self, key: &RecordKey) -> Result<Option<RecordMeta>> {
        self.inner.exists(key)
    }

    fn operate(
        &self,
        key: &RecordKey,
        operations: &[Operation],
        policy: &WritePolicy,
    ) -> Result<Vec<Value>> {
        self.interfere(key, policy)?;
        self.inner.operate(key, operations, policy)
    }

    fn create_index(&self, namespace: &str, set: &str, bin: &str) -> Result<bool> {
        self.inner.create_index(namespace, set, bin)
    }

    fn query(&self, namespace: &str, set: &str, filter: &Filter) -> Result<Vec<(RecordKey, Record)>> {
        self.inner.query(namespace, set, filter)
    }

    fn scan(&self, namespace: &str, set: &str) -> Result<Vec<RecordKey>> {
        self.inner.scan(namespace, set)
    }
}

/// Client over a [`ContendedStore`], with the store handle for inspection.
pub fn contended_client(conflicts: usize) -> (Client, Arc<ContendedStore>) {
    init_tracing();
    let store = Arc::new(ContendedStore::new(conflicts));
    let client = Client::new(store.clone(), &config_for("expanded")).unwrap();
    (client, store)
}

/// Whether an error is the store's type mismatch
pub fn is_type_error(err: &Error) -> bool {
    matches!(err, Error::BinIncompatibleType { .. })
}
