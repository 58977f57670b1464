//! Single-record atomic operations and secondary-index predicates
//!
//! A call to `RecordStore::operate` applies a slice of [`Operation`]s to one
//! record atomically and returns one result per operation, positionally.
//! Operations that only write yield `Value::Nil` in their slot.

use crate::value::Value;

/// One step of an atomic `operate` call
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Add `delta` to an integer bin (absent bin counts as 0)
    Add {
        /// Target bin
        bin: String,
        /// Signed increment
        delta: i64,
    },
    /// Read a bin (`Nil` if absent)
    Read {
        /// Target bin
        bin: String,
    },
    /// Write a bin; writing `Nil` removes it
    Write {
        /// Target bin
        bin: String,
        /// New value
        value: Value,
    },
    /// Refresh the record's TTL from the write policy
    Touch,
    /// Append to a list bin; yields the new length
    ListAppend {
        /// Target bin
        bin: String,
        /// Element to append
        value: Value,
    },
    /// Insert into a list bin at `index`; yields the new length
    ListInsert {
        /// Target bin
        bin: String,
        /// Insert position (negative counts from the end)
        index: i64,
        /// Element to insert
        value: Value,
    },
    /// Remove and yield the element at `index` (`Nil` if out of range)
    ListPop {
        /// Target bin
        bin: String,
        /// Element position (negative counts from the end)
        index: i64,
    },
    /// Yield the list length (0 if absent)
    ListSize {
        /// Target bin
        bin: String,
    },
    /// Keep only `count` elements starting at `start`; yields elements removed
    ListTrim {
        /// Target bin
        bin: String,
        /// First element to keep
        start: usize,
        /// Number of elements to keep
        count: usize,
    },
    /// Put an entry into a map bin; yields the new map size
    MapPut {
        /// Target bin
        bin: String,
        /// Map key
        key: String,
        /// Entry value
        value: Value,
    },
    /// Yield a map entry (`Nil` if absent)
    MapGet {
        /// Target bin
        bin: String,
        /// Map key
        key: String,
    },
    /// Remove and yield a map entry (`Nil` if absent)
    MapRemove {
        /// Target bin
        bin: String,
        /// Map key
        key: String,
    },
    /// Add `delta` to an integer map entry; yields the new value
    MapIncrement {
        /// Target bin
        bin: String,
        /// Map key
        key: String,
        /// Signed increment
        delta: i64,
    },
}

impl Operation {
    /// Increment an integer bin
    pub fn add(bin: impl Into<String>, delta: i64) -> Self {
        Operation::Add {
            bin: bin.into(),
            delta,
        }
    }

    /// Read a bin
    pub fn read(bin: impl Into<String>) -> Self {
        Operation::Read { bin: bin.into() }
    }

    /// Write a bin
    pub fn write(bin: impl Into<String>, value: impl Into<Value>) -> Self {
        Operation::Write {
            bin: bin.into(),
            value: value.into(),
        }
    }

    /// Whether this operation mutates the record
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Operation::Read { .. } | Operation::ListSize { .. } | Operation::MapGet { .. }
        )
    }

    /// Bin this operation targets, if any
    pub fn bin(&self) -> Option<&str> {
        match self {
            Operation::Touch => None,
            Operation::Add { bin, .. }
            | Operation::Read { bin }
            | Operation::Write { bin, .. }
            | Operation::ListAppend { bin, .. }
            | Operation::ListInsert { bin, .. }
            | Operation::ListPop { bin, .. }
            | Operation::ListSize { bin }
            | Operation::ListTrim { bin, .. }
            | Operation::MapPut { bin, .. }
            | Operation::MapGet { bin, .. }
            | Operation::MapRemove { bin, .. }
            | Operation::MapIncrement { bin, .. } => Some(bin),
        }
    }
}

/// Secondary-index predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Bin equals value
    Equal {
        /// Indexed bin
        bin: String,
        /// Value to match
        value: Value,
    },
}

impl Filter {
    /// Equality predicate on an indexed bin
    pub fn equal(bin: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equal {
            bin: bin.into(),
            value: value.into(),
        }
    }

    /// Bin the predicate references
    pub fn bin(&self) -> &str {
        match self {
            Filter::Equal { bin, .. } => bin,
        }
    }

    /// Whether a bin value satisfies the predicate
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            Filter::Equal { value, .. } => value == candidate,
        }
    }
}
