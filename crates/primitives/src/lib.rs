//! Data-structure primitives for Redshim
//!
//! Each primitive maps one family of reference-store commands onto the
//! record store:
//! - **Strings**: binary-safe values with TTL, counters, flushdb
//! - **Lists**: push/pop/range/trim over a native list bin
//! - **Hashes**: three interchangeable layouts behind [`HashStrategy`]
//!
//! ## Design Principle: Stateless Facades
//!
//! Primitives hold only an `Arc<dyn RecordStore>` and a [`Keyspace`]. All
//! state lives in the record store, so any number of primitive instances
//! (in any number of processes) may work on the same keys concurrently.
//! Correctness under that concurrency comes from single-record atomic
//! operations and the create-only / generation races in `redshim-engine`.
//!
//! ## No Cross-Record Transactions
//!
//! Operations spanning several records (expanded hashes, `hmset`, `batch`)
//! are sequences of independent single-record operations. A failure partway
//! through leaves the earlier steps applied.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hash;
pub mod keyspace;
pub mod list;
pub mod strings;

pub use hash::{
    build_hash_strategy, DirectHash, ExpandedMapHash, HashBatch, HashStrategy, RootState,
    SingleBinHash,
};
pub use keyspace::{Keyspace, TtlStatus, VALUE_BIN};
pub use list::{resolve_range, Lists};
pub use strings::Strings;
