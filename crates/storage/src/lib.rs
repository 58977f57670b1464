//! Storage layer for Redshim
//!
//! This crate provides an in-process implementation of the record store
//! contract defined in `redshim-core`:
//! - MemoryRecordStore: BTreeMap-based record store with RwLock
//! - Per-record generations for create-only and expected-generation writes
//! - Secondary bin-equality indices for `query`
//! - TTL index for expiration
//! - TTL cleaner background task
//!
//! It backs the test suites and benches, and serves embedders that want
//! the emulation layers without an external database.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleaner;
pub mod config;
pub mod index;
pub mod memory;
pub mod ops;
pub mod stored_record;
pub mod ttl;

pub use cleaner::TTLCleaner;
pub use config::StoreConfig;
pub use index::{BinIndex, IndexId};
pub use memory::MemoryRecordStore;
pub use stored_record::StoredRecord;
pub use ttl::TTLIndex;
