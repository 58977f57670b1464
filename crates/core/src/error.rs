//! Error types for Redshim
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - Store outcomes that drive optimistic concurrency (`RecordExists`,
//!   `RecordNotFound`, `GenerationMismatch`) are matched by the retry
//!   machinery and usually never reach a caller.
//! - `BinIncompatibleType` is the type-mismatch failure; it is never retried.
//! - `RootUnresolved` is the race-lost-and-unresolved failure of the expanded
//!   hash strategy.
//! - `Backend` carries any other store fault unchanged.

use crate::key::RecordKey;
use std::io;
use thiserror::Error;

/// Result type alias for Redshim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Redshim
#[derive(Debug, Error)]
pub enum Error {
    /// Record does not exist (update-only write, read-only operate)
    #[error("Record not found: {0}")]
    RecordNotFound(RecordKey),

    /// Record already exists (create-only write)
    #[error("Record already exists: {0}")]
    RecordExists(RecordKey),

    /// Generation mismatch (for expected-generation writes)
    #[error("Generation mismatch: expected {expected}, got {actual}")]
    GenerationMismatch {
        /// Expected generation
        expected: u32,
        /// Actual generation found
        actual: u32,
    },

    /// Bin holds a value of the wrong type for the requested operation
    #[error("Bin incompatible type: bin '{bin}' holds {found}")]
    BinIncompatibleType {
        /// Bin that was operated on
        bin: String,
        /// Type name of the value found in the bin
        found: &'static str,
    },

    /// Record would exceed the configured size limit
    #[error("Record too big: {size} bytes exceeds limit of {limit}")]
    RecordTooBig {
        /// Estimated record size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Bin name is empty, too long, or otherwise unusable
    #[error("Invalid bin name: {0:?}")]
    InvalidBinName(String),

    /// Query on a bin without a secondary index
    #[error("Index not found on {namespace}.{set}.{bin}")]
    IndexNotFound {
        /// Namespace queried
        namespace: String,
        /// Set queried
        set: String,
        /// Bin the predicate referenced
        bin: String,
    },

    /// A create-only root write lost its race and the winner never became visible
    #[error("Hash root for {key} still invisible after {waited_ms}ms backoff")]
    RootUnresolved {
        /// Logical key whose root could not be resolved
        key: String,
        /// Backoff waited before giving up
        waited_ms: u64,
    },

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Record store fault (network, server, timeout)
    #[error("Backend error: {0}")]
    Backend(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend(message.into())
    }

    /// Whether this error is a lost optimistic-concurrency race
    ///
    /// Races are resolved by re-reading and adopting the winner's state.
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            Error::RecordExists(_) | Error::GenerationMismatch { .. }
        )
    }

    /// Whether this error only reports logical absence
    pub fn is_logical_miss(&self) -> bool {
        matches!(self, Error::RecordNotFound(_))
    }
}
