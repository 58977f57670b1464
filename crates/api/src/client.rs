//! Client - the reference-store command surface
//!
//! Every command desugars to one primitive call:
//!
//! | Command | Primitive |
//! |---------|-----------|
//! | `get` `set` `setex` `setnx` `setnxex` | `Strings` |
//! | `incr` `decr` `incrby` `decrby` | `Strings` (increment-or-create on bin `r`) |
//! | `del` `ttl` `set_timeout` | the hash strategy (roots first, then the plain record) |
//! | `rpush` `lpush` `rpop` `lpop` `lsize` `lrange` `ltrim` | `Lists` |
//! | `hset` `hget` `hdel` `hmset` `hmget` `hgetall` `hincrby` `hincrby_ex` | the configured `HashStrategy` |
//! | `flushdb` | `Strings::flushdb` over the plain, root and field sets |
//!
//! ## Buffering
//!
//! `multi()` and `pipeline()` hand out a [`Pipeline`] that borrows the
//! client mutably. Its commands run immediately; their replies are captured
//! and returned together by [`Pipeline::exec`].
//!
//! ```
//! use redshim_api::{Client, Reply};
//! use redshim_engine::ShimConfig;
//!
//! let mut client = Client::in_memory(&ShimConfig::default()).unwrap();
//! let mut tx = client.multi();
//! tx.get("myKey").unwrap()
//!     .set("myKey", "value").unwrap()
//!     .get("myKey").unwrap()
//!     .del("myKey").unwrap();
//! assert_eq!(
//!     tx.exec().unwrap(),
//!     vec![Reply::Nil, Reply::Ok, Reply::bulk("value"), Reply::Int(1)]
//! );
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use redshim_core::{RecordStore, Result};
use redshim_engine::codec::Scalar;
use redshim_engine::ShimConfig;
use redshim_primitives::hash::HashContents;
use redshim_primitives::{
    build_hash_strategy, HashBatch, HashStrategy, Keyspace, Lists, Strings, TtlStatus,
};
use redshim_storage::MemoryRecordStore;

use crate::buffer::CommandBuffer;
use crate::reply::Reply;

/// Command surface over one record store
///
/// A client owns its command buffer and is not shared between callers;
/// create one client per caller over a shared store.
pub struct Client {
    strings: Strings,
    lists: Lists,
    hashes: Arc<dyn HashStrategy>,
    buffer: CommandBuffer,
}

impl Client {
    /// Client over an existing store
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the hash strategy cannot
    /// be set up (e.g. its secondary index).
    pub fn new(store: Arc<dyn RecordStore>, config: &ShimConfig) -> Result<Self> {
        config.validate()?;
        let keyspace = Keyspace::from_config(config);
        let hashes = build_hash_strategy(Arc::clone(&store), config)?;
        info!(
            target: "redshim::client",
            namespace = keyspace.namespace(),
            set = keyspace.set(),
            hash_strategy = hashes.name(),
            "client ready"
        );
        Ok(Self {
            strings: Strings::new(Arc::clone(&store), keyspace.clone(), config.retry),
            lists: Lists::new(store, keyspace, config.retry),
            hashes,
            buffer: CommandBuffer::new(),
        })
    }

    /// Client over a fresh in-memory store configured by `config.store`
    pub fn in_memory(config: &ShimConfig) -> Result<Self> {
        let store = Arc::new(MemoryRecordStore::with_config(config.store.clone()));
        Self::new(store, config)
    }

    /// In-memory client configured from a `redshim.toml` file
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::in_memory(&ShimConfig::from_file(path)?)
    }

    /// The hash strategy in use
    pub fn hash_strategy(&self) -> &dyn HashStrategy {
        self.hashes.as_ref()
    }

    /// Whether a multi/pipeline is open
    pub fn is_buffering(&self) -> bool {
        self.buffer.is_buffering()
    }

    // ========================================================================
    // Buffering
    // ========================================================================

    /// Start capturing replies
    pub fn multi(&mut self) -> Pipeline<'_> {
        self.buffer.begin();
        debug!(target: "redshim::client", "multi");
        Pipeline { client: self }
    }

    /// Same as [`Client::multi`]: replies are captured, commands still run
    /// one at a time
    pub fn pipeline(&mut self) -> Pipeline<'_> {
        self.multi()
    }

    // ========================================================================
    // Strings
    // ========================================================================

    /// GET
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.strings.get(key.as_ref())
    }

    /// SET (clears any TTL)
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<()> {
        self.strings.set(key.as_ref(), &value.into())
    }

    /// SETEX
    pub fn setex(&self, key: impl AsRef<[u8]>, ttl_secs: u32, value: impl Into<Scalar>) -> Result<()> {
        self.strings.setex(key.as_ref(), ttl_secs, &value.into())
    }

    /// SETNX
    pub fn setnx(&self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<bool> {
        self.strings.setnx(key.as_ref(), &value.into())
    }

    /// SET NX EX
    pub fn setnxex(
        &self,
        key: impl AsRef<[u8]>,
        ttl_secs: u32,
        value: impl Into<Scalar>,
    ) -> Result<bool> {
        self.strings.setnxex(key.as_ref(), ttl_secs, &value.into())
    }

    /// DEL; returns the number of keys removed (0 or 1)
    pub fn del(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        Ok(i64::from(self.hashes.delete(key.as_ref())?))
    }

    /// TTL
    pub fn ttl(&self, key: impl AsRef<[u8]>) -> Result<TtlStatus> {
        self.hashes.ttl(key.as_ref())
    }

    /// EXPIRE; 0 deletes the key. Returns whether the key existed.
    pub fn set_timeout(&self, key: impl AsRef<[u8]>, ttl_secs: u32) -> Result<bool> {
        self.hashes.set_timeout(key.as_ref(), ttl_secs)
    }

    /// INCR
    pub fn incr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.strings.incr(key.as_ref())
    }

    /// DECR
    pub fn decr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.strings.decr(key.as_ref())
    }

    /// INCRBY
    pub fn incrby(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        self.strings.incrby(key.as_ref(), delta)
    }

    /// DECRBY
    pub fn decrby(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        self.strings.decrby(key.as_ref(), delta)
    }

    /// FLUSHDB over this client's sets; returns the number of records removed
    pub fn flushdb(&self) -> Result<usize> {
        let removed = self.strings.flushdb()?;
        info!(target: "redshim::client", removed, "flushdb");
        Ok(removed)
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// RPUSH
    pub fn rpush(&self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<i64> {
        self.lists.rpush(key.as_ref(), &value.into())
    }

    /// LPUSH
    pub fn lpush(&self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<i64> {
        self.lists.lpush(key.as_ref(), &value.into())
    }

    /// RPOP
    pub fn rpop(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.lists.rpop(key.as_ref())
    }

    /// LPOP
    pub fn lpop(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.lists.lpop(key.as_ref())
    }

    /// LLEN
    pub fn lsize(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.lists.lsize(key.as_ref())
    }

    /// LRANGE
    pub fn lrange(&self, key: impl AsRef<[u8]>, start: i64, end: i64) -> Result<Vec<Vec<u8>>> {
        self.lists.lrange(key.as_ref(), start, end)
    }

    /// LTRIM
    pub fn ltrim(&self, key: impl AsRef<[u8]>, start: i64, end: i64) -> Result<()> {
        self.lists.ltrim(key.as_ref(), start, end)
    }

    // ========================================================================
    // Hashes
    // ========================================================================

    /// HSET; returns 1 for a new field, 0 for an overwrite
    pub fn hset(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl Into<Scalar>,
    ) -> Result<i64> {
        self.hashes
            .hset(key.as_ref(), field.as_ref(), &value.into())
    }

    /// HGET
    pub fn hget(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.hashes.hget(key.as_ref(), field.as_ref())
    }

    /// HDEL
    pub fn hdel(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<i64> {
        self.hashes.hdel(key.as_ref(), field.as_ref())
    }

    /// HMSET; fields are written in order and a failure leaves earlier
    /// fields written
    pub fn hmset<F, V>(&self, key: impl AsRef<[u8]>, entries: impl IntoIterator<Item = (F, V)>) -> Result<()>
    where
        F: AsRef<[u8]>,
        V: Into<Scalar>,
    {
        let owned: Vec<(Vec<u8>, Scalar)> = entries
            .into_iter()
            .map(|(field, value)| (field.as_ref().to_vec(), value.into()))
            .collect();
        let borrowed: Vec<(&[u8], Scalar)> = owned
            .iter()
            .map(|(field, value)| (field.as_slice(), value.clone()))
            .collect();
        self.hashes.hmset(key.as_ref(), &borrowed)
    }

    /// HMGET; one entry per requested field, in request order
    pub fn hmget<F: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, fields: &[F]) -> Result<Vec<Option<Vec<u8>>>> {
        let fields: Vec<&[u8]> = fields.iter().map(AsRef::as_ref).collect();
        self.hashes.hmget(key.as_ref(), &fields)
    }

    /// HGETALL
    pub fn hgetall(&self, key: impl AsRef<[u8]>) -> Result<HashContents> {
        self.hashes.hgetall(key.as_ref())
    }

    /// HINCRBY
    pub fn hincrby(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        self.hashes.hincrby(key.as_ref(), field.as_ref(), delta)
    }

    /// HINCRBY that also sets the hash TTL in seconds; 0 = never expire
    pub fn hincrby_ex(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
        ttl_secs: u32,
    ) -> Result<i64> {
        self.hashes
            .hincrby_ex(key.as_ref(), field.as_ref(), delta, ttl_secs)
    }

    /// Several field increments and a TTL on one hash; best-effort, in order
    pub fn hbatch(&self, key: impl AsRef<[u8]>, batch: &HashBatch) -> Result<Vec<i64>> {
        self.hashes.batch(key.as_ref(), batch)
    }
}

/// An open multi/pipeline
///
/// Each command runs immediately and captures its reply. `exec` returns the
/// replies in call order; dropping the pipeline without `exec` discards
/// them. A command that fails returns its error and captures nothing; the
/// pipeline stays open.
pub struct Pipeline<'a> {
    client: &'a mut Client,
}

impl<'a> Pipeline<'a> {
    fn capture<T: Into<Reply>>(&mut self, result: Result<T>) -> Result<&mut Self> {
        self.client.buffer.capture(result?.into())?;
        Ok(self)
    }

    /// Number of replies captured so far
    pub fn len(&self) -> usize {
        self.client.buffer.len()
    }

    /// Whether nothing has been captured yet
    pub fn is_empty(&self) -> bool {
        self.client.buffer.is_empty()
    }

    /// Close the pipeline and return the captured replies
    pub fn exec(self) -> Result<Vec<Reply>> {
        let replies = self.client.buffer.exec()?;
        debug!(target: "redshim::client", replies = replies.len(), "exec");
        Ok(replies)
    }

    /// GET
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.get(key);
        self.capture(r)
    }

    /// SET
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<&mut Self> {
        let r = self.client.set(key, value);
        self.capture(r)
    }

    /// SETEX
    pub fn setex(
        &mut self,
        key: impl AsRef<[u8]>,
        ttl_secs: u32,
        value: impl Into<Scalar>,
    ) -> Result<&mut Self> {
        let r = self.client.setex(key, ttl_secs, value);
        self.capture(r)
    }

    /// SETNX
    pub fn setnx(&mut self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<&mut Self> {
        let r = self.client.setnx(key, value);
        self.capture(r)
    }

    /// SET NX EX
    pub fn setnxex(
        &mut self,
        key: impl AsRef<[u8]>,
        ttl_secs: u32,
        value: impl Into<Scalar>,
    ) -> Result<&mut Self> {
        let r = self.client.setnxex(key, ttl_secs, value);
        self.capture(r)
    }

    /// DEL
    pub fn del(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.del(key);
        self.capture(r)
    }

    /// TTL
    pub fn ttl(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.ttl(key);
        self.capture(r)
    }

    /// EXPIRE
    pub fn set_timeout(&mut self, key: impl AsRef<[u8]>, ttl_secs: u32) -> Result<&mut Self> {
        let r = self.client.set_timeout(key, ttl_secs);
        self.capture(r)
    }

    /// INCR
    pub fn incr(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.incr(key);
        self.capture(r)
    }

    /// DECR
    pub fn decr(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.decr(key);
        self.capture(r)
    }

    /// INCRBY
    pub fn incrby(&mut self, key: impl AsRef<[u8]>, delta: i64) -> Result<&mut Self> {
        let r = self.client.incrby(key, delta);
        self.capture(r)
    }

    /// DECRBY
    pub fn decrby(&mut self, key: impl AsRef<[u8]>, delta: i64) -> Result<&mut Self> {
        let r = self.client.decrby(key, delta);
        self.capture(r)
    }

    /// FLUSHDB
    pub fn flushdb(&mut self) -> Result<&mut Self> {
        let r = self.client.flushdb().map(|_| ());
        self.capture(r)
    }

    /// RPUSH
    pub fn rpush(&mut self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<&mut Self> {
        let r = self.client.rpush(key, value);
        self.capture(r)
    }

    /// LPUSH
    pub fn lpush(&mut self, key: impl AsRef<[u8]>, value: impl Into<Scalar>) -> Result<&mut Self> {
        let r = self.client.lpush(key, value);
        self.capture(r)
    }

    /// RPOP
    pub fn rpop(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.rpop(key);
        self.capture(r)
    }

    /// LPOP
    pub fn lpop(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.lpop(key);
        self.capture(r)
    }

    /// LLEN
    pub fn lsize(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.lsize(key);
        self.capture(r)
    }

    /// LRANGE
    pub fn lrange(&mut self, key: impl AsRef<[u8]>, start: i64, end: i64) -> Result<&mut Self> {
        let r = self.client.lrange(key, start, end);
        self.capture(r)
    }

    /// LTRIM
    pub fn ltrim(&mut self, key: impl AsRef<[u8]>, start: i64, end: i64) -> Result<&mut Self> {
        let r = self.client.ltrim(key, start, end);
        self.capture(r)
    }

    /// HSET
    pub fn hset(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl Into<Scalar>,
    ) -> Result<&mut Self> {
        let r = self.client.hset(key, field, value);
        self.capture(r)
    }

    /// HGET
    pub fn hget(&mut self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.hget(key, field);
        self.capture(r)
    }

    /// HDEL
    pub fn hdel(&mut self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.hdel(key, field);
        self.capture(r)
    }

    /// HMSET
    pub fn hmset<F, V>(
        &mut self,
        key: impl AsRef<[u8]>,
        entries: impl IntoIterator<Item = (F, V)>,
    ) -> Result<&mut Self>
    where
        F: AsRef<[u8]>,
        V: Into<Scalar>,
    {
        let r = self.client.hmset(key, entries);
        self.capture(r)
    }

    /// HMGET
    pub fn hmget<F: AsRef<[u8]>>(&mut self, key: impl AsRef<[u8]>, fields: &[F]) -> Result<&mut Self> {
        let r = self.client.hmget(key, fields);
        self.capture(r)
    }

    /// HGETALL
    pub fn hgetall(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Self> {
        let r = self.client.hgetall(key);
        self.capture(r)
    }

    /// HINCRBY
    pub fn hincrby(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
    ) -> Result<&mut Self> {
        let r = self.client.hincrby(key, field, delta);
        self.capture(r)
    }

    /// HINCRBY with a hash TTL
    pub fn hincrby_ex(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
        ttl_secs: u32,
    ) -> Result<&mut Self> {
        let r = self.client.hincrby_ex(key, field, delta, ttl_secs);
        self.capture(r)
    }
}

impl Drop for Pipeline<'_> {
    fn drop(&mut self) {
        if self.client.buffer.is_buffering() {
            debug!(target: "redshim::client", discarded = self.client.buffer.len(), "pipeline dropped without exec");
            self.client.buffer.discard();
        }
    }
}
