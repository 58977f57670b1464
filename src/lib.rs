//! Redshim - reference in-memory data-structure store semantics on an atomic record store
//!
//! Redshim lets code written against the reference store's string, list and
//! hash commands run on top of a record store that only offers keyed records
//! made of named bins, single-record atomic operations, per-record TTLs and
//! secondary indexes.
//!
//! # Quick Start
//!
//! ```
//! use redshim::{Client, Reply, ShimConfig};
//!
//! let mut client = Client::in_memory(&ShimConfig::default()).unwrap();
//!
//! client.hset("user:1", "name", "Alice").unwrap();
//! client.hincrby("user:1", "logins", 1).unwrap();
//!
//! let mut tx = client.multi();
//! tx.hget("user:1", "name").unwrap().rpush("events", "login").unwrap();
//! assert_eq!(tx.exec().unwrap(), vec![Reply::bulk("Alice"), Reply::Int(1)]);
//! ```
//!
//! # Architecture
//!
//! All commands go through the [`Client`], which routes them to the string,
//! list and hash primitives. The record store contract lives in
//! `redshim-core`; `MemoryRecordStore` is the bundled implementation.

pub use redshim_api::*;
pub use redshim_core::{Error, RecordStore, Result};
pub use redshim_engine::{HashStrategyKind, OrphanPolicy, Scalar, ShimConfig, CONFIG_FILE_NAME};
pub use redshim_primitives::{HashBatch, TtlStatus};
pub use redshim_storage::{MemoryRecordStore, StoreConfig};
