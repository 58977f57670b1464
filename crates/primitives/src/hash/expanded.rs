//! Expanded-map hashes: a root record plus one record per field
//!
//! ## Layout
//!
//! ```text
//! <set>_hroot   key                   { g: suffix, c: created µs }
//! <set>_hfield  suffix ":" field      { g: suffix, k: key, f: field, v: value, c: created µs }
//! ```
//!
//! The root holds the **generation suffix**: 16 random hex characters
//! naming the current incarnation of the hash. Field records are keyed by
//! suffix and field, and carry the suffix in bin `g`, which has a secondary
//! index. `hgetall` is an index query for `g == suffix`.
//!
//! ## Generations
//!
//! Deleting a hash deletes only its root. The field records of that
//! generation become orphans: no root names their suffix, so no read can
//! reach them. The next write creates a root with a fresh suffix and an
//! empty set of fields. Orphans expire with their TTL; under
//! `OrphanPolicy::BestEffort` deletion also removes up to `limit` of them.
//!
//! ## Root creation race
//!
//! Writers that find no root create one under create-only. A writer that
//! loses the race adopts the winner's suffix. If the winner's root is not
//! readable yet, the loser waits `root_backoff` once and reads again; a
//! root still missing after that is `Error::RootUnresolved`.
//!
//! Nothing spanning the root and its fields is atomic: a concurrent reader
//! may see a root whose first field is not written yet.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use redshim_core::{
    BinMap, Error, Filter, Record, RecordKey, RecordStore, Result, Timestamp, Ttl, Value,
    WritePolicy,
};
use redshim_engine::codec::{self, Scalar};
use redshim_engine::{increment_numeric, Increment, OrphanPolicy, RetryConfig, ShimConfig};

use super::{HashBatch, HashContents, HashStrategy};
use crate::keyspace::{self, Keyspace, TtlStatus};

/// Bin holding the generation suffix (indexed on field records)
const GENERATION_BIN: &str = "g";
/// Bin holding the logical key on field records
const KEY_BIN: &str = "k";
/// Bin holding the field name on field records
const FIELD_BIN: &str = "f";
/// Bin holding the field value
const VALUE_BIN: &str = "v";
/// Bin holding the creation time in microseconds
const CREATED_BIN: &str = "c";

/// Suffix length in hex characters
const SUFFIX_LEN: usize = 16;

/// Where a logical key's root stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootState {
    /// No root: the hash is empty
    Absent,
    /// This writer is attempting a create-only write of a root with this
    /// candidate suffix
    Creating(String),
    /// A root exists with this suffix
    Live(String),
}

/// Hash spread over a root record and one record per field
#[derive(Clone)]
pub struct ExpandedMapHash {
    store: Arc<dyn RecordStore>,
    keyspace: Keyspace,
    root_set: String,
    field_set: String,
    ttl: Ttl,
    root_backoff: Duration,
    orphans: OrphanPolicy,
    retry: RetryConfig,
}

impl ExpandedMapHash {
    /// Create the strategy and the secondary index on the field set
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the index cannot be
    /// created.
    pub fn new(store: Arc<dyn RecordStore>, keyspace: Keyspace, config: &ShimConfig) -> Result<Self> {
        let root_set = keyspace.root_set();
        let field_set = keyspace.field_set();
        store.create_index(keyspace.namespace(), &field_set, GENERATION_BIN)?;
        Ok(Self {
            store,
            keyspace,
            root_set,
            field_set,
            ttl: config.hash_ttl(),
            root_backoff: config.root_backoff(),
            orphans: config.orphan_policy()?,
            retry: config.retry,
        })
    }

    fn root_key(&self, key: &[u8]) -> RecordKey {
        RecordKey::new(self.keyspace.namespace(), self.root_set.as_str(), key)
    }

    fn field_key(&self, suffix: &str, field: &[u8]) -> RecordKey {
        let mut user_key = Vec::with_capacity(suffix.len() + 1 + field.len());
        user_key.extend_from_slice(suffix.as_bytes());
        user_key.push(b':');
        user_key.extend_from_slice(field);
        RecordKey::new(self.keyspace.namespace(), self.field_set.as_str(), user_key)
    }

    /// Bins identifying a field record: suffix, logical key, field name
    fn identity_bins(suffix: &str, key: &[u8], field: &[u8]) -> BinMap {
        let mut bins = BinMap::new();
        bins.insert(GENERATION_BIN.to_string(), Value::from(suffix));
        bins.insert(KEY_BIN.to_string(), codec::encode(key));
        bins.insert(FIELD_BIN.to_string(), codec::encode(field));
        bins
    }

    /// Read-only lookup of the root
    ///
    /// Returns `Absent` or `Live`.
    pub fn resolve_root(&self, key: &[u8]) -> Result<RootState> {
        let record = self
            .store
            .get(&self.root_key(key), Some(&[GENERATION_BIN][..]))?;
        Ok(
            match record.as_ref().and_then(|r| r.bin(GENERATION_BIN)).and_then(Value::as_str) {
                Some(suffix) => RootState::Live(suffix.to_string()),
                None => RootState::Absent,
            },
        )
    }

    /// Find the live root, creating one if absent
    ///
    /// A found root has its TTL refreshed to `ttl`. Returns the suffix and
    /// whether this call created the root.
    ///
    /// # Errors
    ///
    /// `RootUnresolved` if a concurrent creator won the race but its root
    /// is still unreadable after the backoff.
    pub fn resolve_or_create_root(&self, key: &[u8], ttl: Ttl) -> Result<(String, bool)> {
        let root_key = self.root_key(key);
        let mut state = self.resolve_root(key)?;
        loop {
            state = match state {
                RootState::Live(suffix) => {
                    if self.store.touch(&root_key, ttl)? {
                        return Ok((suffix, false));
                    }
                    // Deleted between read and touch
                    RootState::Absent
                }
                RootState::Absent => RootState::Creating(new_suffix()),
                RootState::Creating(suffix) => {
                    let mut bins = BinMap::new();
                    bins.insert(GENERATION_BIN.to_string(), Value::from(suffix.as_str()));
                    bins.insert(CREATED_BIN.to_string(), now_micros());
                    match self
                        .store
                        .put(&root_key, bins, &WritePolicy::create_only().with_ttl(ttl))
                    {
                        Ok(()) => {
                            debug!(target: "redshim::hash", key = %root_key, suffix = %suffix, "hash root created");
                            return Ok((suffix, true));
                        }
                        Err(Error::RecordExists(_)) => self.adopt_winner(key, &root_key)?,
                        Err(e) => return Err(e),
                    }
                }
            };
        }
    }

    /// After losing a create race, read the winner's root
    fn adopt_winner(&self, key: &[u8], root_key: &RecordKey) -> Result<RootState> {
        let mut state = self.resolve_root(key)?;
        if state == RootState::Absent {
            thread::sleep(self.root_backoff);
            state = self.resolve_root(key)?;
        }
        match &state {
            RootState::Live(suffix) => {
                debug!(target: "redshim::hash", key = %root_key, suffix = %suffix, "root race lost; adopting winner");
                Ok(state)
            }
            _ => {
                let waited_ms = self.root_backoff.as_millis() as u64;
                warn!(target: "redshim::hash", key = %root_key, waited_ms, "root still missing after losing create race");
                Err(Error::RootUnresolved {
                    key: root_key.user_key_lossy(),
                    waited_ms,
                })
            }
        }
    }

    fn live_suffix(&self, key: &[u8]) -> Result<Option<String>> {
        Ok(match self.resolve_root(key)? {
            RootState::Live(suffix) => Some(suffix),
            _ => None,
        })
    }

    /// Field records of one generation
    fn fields_of(&self, suffix: &str) -> Result<Vec<(RecordKey, Record)>> {
        self.store.query(
            self.keyspace.namespace(),
            &self.field_set,
            &Filter::equal(GENERATION_BIN, suffix),
        )
    }

    fn hincrby_with_ttl(&self, key: &[u8], field: &[u8], delta: i64, ttl: Ttl) -> Result<i64> {
        let (suffix, _) = self.resolve_or_create_root(key, ttl)?;
        self.increment_field(&suffix, key, field, delta, ttl)
    }

    fn increment_field(
        &self,
        suffix: &str,
        key: &[u8],
        field: &[u8],
        delta: i64,
        ttl: Ttl,
    ) -> Result<i64> {
        let field_key = self.field_key(suffix, field);
        let mut increment = Increment::new(&field_key, VALUE_BIN, delta)
            .with_ttl(ttl)
            .with_on_create(CREATED_BIN, now_micros());
        increment.companions = Self::identity_bins(suffix, key, field);
        increment_numeric(self.store.as_ref(), &increment, &self.retry)
    }

    /// Delete up to `limit` field records of a dead generation
    fn remove_orphans(&self, root_key: &RecordKey, suffix: &str, limit: usize) -> Result<usize> {
        let mut removed = 0;
        for (field_key, _) in self.fields_of(suffix)?.into_iter().take(limit) {
            if self.store.remove(&field_key)? {
                removed += 1;
            }
        }
        debug!(target: "redshim::hash", key = %root_key, suffix, removed, "orphaned fields removed");
        Ok(removed)
    }
}

impl HashStrategy for ExpandedMapHash {
    fn name(&self) -> &'static str {
        "expanded"
    }

    fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &Scalar) -> Result<i64> {
        let (suffix, created) = self.resolve_or_create_root(key, self.ttl)?;
        let field_key = self.field_key(&suffix, field);
        let mut bins = Self::identity_bins(&suffix, key, field);
        bins.insert(VALUE_BIN.to_string(), codec::encode_scalar(value));

        let mut first_write = bins.clone();
        first_write.insert(CREATED_BIN.to_string(), now_micros());
        let create = WritePolicy::create_only().with_ttl(self.ttl);
        match self.store.put(&field_key, first_write, &create) {
            Ok(()) => Ok(1),
            Err(Error::RecordExists(_)) => {
                self.store
                    .put(&field_key, bins, &WritePolicy::new().with_ttl(self.ttl))?;
                Ok(i64::from(created))
            }
            Err(e) => Err(e),
        }
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(suffix) = self.live_suffix(key)? else {
            return Ok(None);
        };
        let record = self
            .store
            .get(&self.field_key(&suffix, field), Some(&[VALUE_BIN][..]))?;
        Ok(record
            .as_ref()
            .and_then(|r| r.bin(VALUE_BIN))
            .map(codec::decode))
    }

    fn hdel(&self, key: &[u8], field: &[u8]) -> Result<i64> {
        let Some(suffix) = self.live_suffix(key)? else {
            return Ok(0);
        };
        Ok(i64::from(self.store.remove(&self.field_key(&suffix, field))?))
    }

    fn hgetall(&self, key: &[u8]) -> Result<HashContents> {
        let Some(suffix) = self.live_suffix(key)? else {
            return Ok(HashContents::new());
        };
        Ok(self
            .fields_of(&suffix)?
            .into_iter()
            .filter_map(|(_, record)| {
                let field = record.bin(FIELD_BIN)?;
                let value = record.bin(VALUE_BIN)?;
                Some((codec::decode(field), codec::decode(value)))
            })
            .collect())
    }

    fn hincrby(&self, key: &[u8], field: &[u8], delta: i64) -> Result<i64> {
        self.hincrby_with_ttl(key, field, delta, self.ttl)
    }

    /// Delete the root; if there was none, delete the plain record instead
    fn delete(&self, key: &[u8]) -> Result<bool> {
        let root_key = self.root_key(key);
        let suffix = self.live_suffix(key)?;
        if self.store.remove(&root_key)? {
            if let (Some(suffix), OrphanPolicy::BestEffort { limit }) = (suffix, self.orphans) {
                // The hash is already gone; leftover fields still expire by TTL
                if let Err(e) = self.remove_orphans(&root_key, &suffix, limit) {
                    warn!(target: "redshim::hash", key = %root_key, suffix = %suffix, error = %e, "orphan cleanup failed");
                }
            }
            return Ok(true);
        }
        self.store.remove(&self.keyspace.key(key))
    }

    fn ttl(&self, key: &[u8]) -> Result<TtlStatus> {
        match self.store.exists(&self.root_key(key))? {
            Some(meta) => Ok(TtlStatus::from_meta(Some(meta))),
            None => keyspace::ttl_of(self.store.as_ref(), &self.keyspace.key(key)),
        }
    }

    /// Set the TTL of the root and every live field record
    fn set_timeout(&self, key: &[u8], ttl_secs: u32) -> Result<bool> {
        let Some(suffix) = self.live_suffix(key)? else {
            return keyspace::expire(self.store.as_ref(), &self.keyspace.key(key), ttl_secs);
        };
        if ttl_secs == 0 {
            return self.delete(key);
        }
        let ttl = Ttl::Seconds(ttl_secs);
        if !self.store.touch(&self.root_key(key), ttl)? {
            return Ok(false);
        }
        for (field_key, _) in self.fields_of(&suffix)? {
            self.store.touch(&field_key, ttl)?;
        }
        Ok(true)
    }

    /// One root resolution, then each increment through the retry policy
    fn batch(&self, key: &[u8], batch: &HashBatch) -> Result<Vec<i64>> {
        let ttl = batch.ttl().unwrap_or(self.ttl);
        let (suffix, _) = self.resolve_or_create_root(key, ttl)?;
        batch
            .increments
            .iter()
            .map(|(field, delta)| self.increment_field(&suffix, key, field, *delta, ttl))
            .collect()
    }
}

/// Fresh generation suffix: 16 lowercase hex characters
fn new_suffix() -> String {
    format!("{:0width$x}", rand::thread_rng().gen::<u64>(), width = SUFFIX_LEN)
}

fn now_micros() -> Value {
    Value::Int(i64::try_from(Timestamp::now().as_micros()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redshim_storage::MemoryRecordStore;

    fn setup() -> (Arc<MemoryRecordStore>, ExpandedMapHash) {
        setup_with(ShimConfig::default())
    }

    fn setup_with(config: ShimConfig) -> (Arc<MemoryRecordStore>, ExpandedMapHash) {
        let store = Arc::new(MemoryRecordStore::new());
        let hash =
            ExpandedMapHash::new(store.clone(), Keyspace::from_config(&config), &config).unwrap();
        (store, hash)
    }

    fn live(hash: &ExpandedMapHash, key: &[u8]) -> String {
        match hash.resolve_root(key).unwrap() {
            RootState::Live(suffix) => suffix,
            other => panic!("expected live root, got {:?}", other),
        }
    }

    #[test]
    fn test_suffix_format() {
        let suffix = new_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_root_created_lazily() {
        let (_, hash) = setup();
        assert_eq!(hash.resolve_root(b"k").unwrap(), RootState::Absent);

        let (suffix, created) = hash.resolve_or_create_root(b"k", Ttl::Never).unwrap();
        assert!(created);
        assert_eq!(hash.resolve_root(b"k").unwrap(), RootState::Live(suffix.clone()));

        let (again, created) = hash.resolve_or_create_root(b"k", Ttl::Never).unwrap();
        assert!(!created);
        assert_eq!(again, suffix);
    }

    #[test]
    fn test_field_record_layout() {
        let (store, hash) = setup();
        hash.hset(b"user:1", b"name", &Scalar::from("ann")).unwrap();
        let suffix = live(&hash, b"user:1");

        let field = store
            .get(&hash.field_key(&suffix, b"name"), None)
            .unwrap()
            .unwrap();
        assert_eq!(field.bin("g"), Some(&Value::from(suffix.as_str())));
        assert_eq!(field.bin("k"), Some(&Value::from("user:1")));
        assert_eq!(field.bin("f"), Some(&Value::from("name")));
        assert_eq!(field.bin("v"), Some(&Value::from("ann")));
        assert!(field.bin("c").and_then(Value::as_int).is_some());

        let root = store.get(&hash.root_key(b"user:1"), None).unwrap().unwrap();
        assert_eq!(root.bin("g"), Some(&Value::from(suffix.as_str())));
        assert!(root.bin("c").is_some());
    }

    #[test]
    fn test_overwrite_keeps_created_time() {
        let (store, hash) = setup();
        hash.hset(b"k", b"f", &Scalar::from("1")).unwrap();
        let field_key = hash.field_key(&live(&hash, b"k"), b"f");
        let created = store.get(&field_key, None).unwrap().unwrap().bin("c").cloned();

        assert_eq!(hash.hset(b"k", b"f", &Scalar::from("2")).unwrap(), 0);
        let record = store.get(&field_key, None).unwrap().unwrap();
        assert_eq!(record.bin("c").cloned(), created);
        assert_eq!(record.bin("v"), Some(&Value::from("2")));
    }

    #[test]
    fn test_del_orphans_old_generation() {
        let (store, hash) = setup();
        hash.hset(b"k", b"a", &Scalar::from("1")).unwrap();
        hash.hset(b"k", b"b", &Scalar::from("2")).unwrap();
        let old = live(&hash, b"k");

        assert!(hash.delete(b"k").unwrap());
        assert_eq!(hash.resolve_root(b"k").unwrap(), RootState::Absent);
        assert!(hash.hgetall(b"k").unwrap().is_empty());
        assert_eq!(hash.hget(b"k", b"a").unwrap(), None);

        // Orphans stay under the default policy but are unreachable
        assert!(store.get(&hash.field_key(&old, b"a"), None).unwrap().is_some());

        hash.hset(b"k", b"c", &Scalar::from("3")).unwrap();
        let new = live(&hash, b"k");
        assert_ne!(new, old);
        let all = hash.hgetall(b"k").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(b"c".as_slice()), Some(&b"3".to_vec()));
    }

    #[test]
    fn test_best_effort_removes_orphans() {
        let config = ShimConfig {
            orphan_cleanup: "best_effort".to_string(),
            orphan_cleanup_limit: 2,
            ..ShimConfig::default()
        };
        let (store, hash) = setup_with(config);
        for field in [b"a", b"b", b"c"] {
            hash.hset(b"k", field, &Scalar::from("x")).unwrap();
        }
        let old = live(&hash, b"k");
        hash.delete(b"k").unwrap();

        let left = store
            .query("test", "redis_hfield", &Filter::equal("g", old.as_str()))
            .unwrap();
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_delete_falls_through_to_plain_record() {
        let (store, hash) = setup();
        let plain = Keyspace::new("test", "redis").key(b"s");
        let mut bins = BinMap::new();
        bins.insert("r".to_string(), Value::from("text"));
        store.put(&plain, bins, &WritePolicy::default()).unwrap();

        assert!(hash.delete(b"s").unwrap());
        assert!(store.get(&plain, None).unwrap().is_none());
        assert!(!hash.delete(b"s").unwrap());
    }

    #[test]
    fn test_ttl_prefers_root() {
        let (store, hash) = setup();
        let plain = Keyspace::new("test", "redis").key(b"k");
        let mut bins = BinMap::new();
        bins.insert("r".to_string(), Value::from("text"));
        store.put(&plain, bins, &WritePolicy::new().with_ttl(Ttl::Never)).unwrap();
        assert_eq!(hash.ttl(b"k").unwrap(), TtlStatus::Persistent);

        hash.hset(b"k", b"f", &Scalar::from("v")).unwrap();
        assert_eq!(hash.ttl(b"k").unwrap(), TtlStatus::Expires(2_678_400));
    }

    #[test]
    fn test_set_timeout_touches_fields() {
        let (store, hash) = setup();
        hash.hset(b"k", b"f", &Scalar::from("v")).unwrap();
        let field_key = hash.field_key(&live(&hash, b"k"), b"f");

        assert!(hash.set_timeout(b"k", 30).unwrap());
        assert_eq!(hash.ttl(b"k").unwrap(), TtlStatus::Expires(30));
        let field_ttl = store.exists(&field_key).unwrap().unwrap();
        assert_eq!(TtlStatus::from_meta(Some(field_ttl)), TtlStatus::Expires(30));
    }

    #[test]
    fn test_zero_ttl_config_means_persistent() {
        let config = ShimConfig {
            hash_ttl_secs: 0,
            ..ShimConfig::default()
        };
        let (_, hash) = setup_with(config);
        hash.hset(b"k", b"f", &Scalar::from("v")).unwrap();
        assert_eq!(hash.ttl(b"k").unwrap(), TtlStatus::Persistent);
    }

    #[test]
    fn test_hincrby_keeps_record_discoverable() {
        let (_, hash) = setup();
        assert_eq!(hash.hincrby(b"k", b"n", 2).unwrap(), 2);
        assert_eq!(hash.hincrby(b"k", b"n", 3).unwrap(), 5);
        let all = hash.hgetall(b"k").unwrap();
        assert_eq!(all.get(b"n".as_slice()), Some(&b"5".to_vec()));
    }

    #[test]
    fn test_binary_field_names() {
        let (_, hash) = setup();
        let field = b"f\x00\xff".to_vec();
        hash.hset(b"k", &field, &Scalar::from("v")).unwrap();
        assert_eq!(hash.hget(b"k", &field).unwrap(), Some(b"v".to_vec()));
        assert!(hash.hgetall(b"k").unwrap().contains_key(&field));
    }

    #[test]
    fn test_hashes_do_not_share_fields() {
        let (_, hash) = setup();
        hash.hset(b"k1", b"f", &Scalar::from("1")).unwrap();
        hash.hset(b"k2", b"f", &Scalar::from("2")).unwrap();
        assert_eq!(hash.hget(b"k1", b"f").unwrap(), Some(b"1".to_vec()));
        assert_eq!(hash.hgetall(b"k2").unwrap().len(), 1);
    }
}
