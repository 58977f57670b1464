//! Records as returned by the record store

use std::time::Duration;

use crate::value::{BinMap, Value};

/// A record read from the store: its bins plus metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Bin values (only the requested bins for projected reads)
    pub bins: BinMap,
    /// Write generation, incremented on every successful write
    pub generation: u32,
    /// Remaining time to live; `None` means the record never expires
    pub ttl: Option<Duration>,
}

impl Record {
    /// Get a bin value, if present
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }

    /// Remove and return a bin value, `Value::Nil` if absent
    pub fn take_bin(&mut self, name: &str) -> Value {
        self.bins.remove(name).unwrap_or(Value::Nil)
    }

    /// Metadata view of this record
    pub fn meta(&self) -> RecordMeta {
        RecordMeta {
            generation: self.generation,
            ttl: self.ttl,
        }
    }
}

/// Record metadata returned by `exists`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    /// Write generation
    pub generation: u32,
    /// Remaining time to live; `None` means the record never expires
    pub ttl: Option<Duration>,
}
