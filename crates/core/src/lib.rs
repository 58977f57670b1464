//! Core types and traits for Redshim
//!
//! This crate defines the foundational types shared by every layer:
//! - RecordKey: (namespace, set, user key) address of one physical record
//! - Value: the record store's bin value model (integers, text, lists, maps)
//! - Record / RecordMeta: bins plus generation and remaining TTL
//! - Ttl / WritePolicy: per-write expiry and existence/generation policies
//! - Operation / Filter: atomic single-record operations and index predicates
//! - Timestamp: microsecond wall-clock time
//! - Limits: record-size and bin-name constraints
//! - Error: error type hierarchy
//! - RecordStore: the record store adapter contract consumed by upper layers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod limits;
pub mod operation;
pub mod policy;
pub mod record;
pub mod timestamp;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use key::RecordKey;
pub use limits::Limits;
pub use operation::{Filter, Operation};
pub use policy::{GenerationPolicy, RecordExistsAction, Ttl, WritePolicy};
pub use record::{Record, RecordMeta};
pub use timestamp::Timestamp;
pub use traits::RecordStore;
pub use value::{BinMap, Value};
