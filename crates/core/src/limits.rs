//! Size limits for records and bin names
//!
//! The record store rejects writes whose estimated record size exceeds
//! `max_record_bytes` with `RecordTooBig`, and bin names that are empty or
//! longer than `max_bin_name_bytes` with `InvalidBinName`.
//!
//! Field-per-bin hash layouts hit both limits first: every hash field becomes
//! a bin name, and every field value lands in the same record.

use crate::error::{Error, Result};
use crate::value::BinMap;
use serde::{Deserialize, Serialize};

/// Default maximum record size (8 MiB)
pub const DEFAULT_MAX_RECORD_BYTES: usize = 8 * 1024 * 1024;

/// Default maximum bin name length
pub const DEFAULT_MAX_BIN_NAME_BYTES: usize = 15;

/// Size limits enforced by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum estimated record size in bytes (default: 8 MiB)
    pub max_record_bytes: usize,

    /// Maximum bin name length in bytes (default: 15)
    pub max_bin_name_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            max_bin_name_bytes: DEFAULT_MAX_BIN_NAME_BYTES,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_record_bytes: 256,
            max_bin_name_bytes: 15,
        }
    }

    /// Validate a bin name
    pub fn validate_bin_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.len() > self.max_bin_name_bytes {
            return Err(Error::InvalidBinName(name.to_string()));
        }
        Ok(())
    }

    /// Validate every bin name of a record
    pub fn validate_bins(&self, bins: &BinMap) -> Result<()> {
        bins.keys().try_for_each(|name| self.validate_bin_name(name))
    }

    /// Estimated stored size of a record's bins
    pub fn record_size(bins: &BinMap) -> usize {
        bins.iter()
            .map(|(name, value)| name.len() + value.estimated_size())
            .sum()
    }

    /// Validate a record's estimated size
    pub fn validate_record_size(&self, bins: &BinMap) -> Result<()> {
        let size = Self::record_size(bins);
        if size > self.max_record_bytes {
            return Err(Error::RecordTooBig {
                size,
                limit: self.max_record_bytes,
            });
        }
        Ok(())
    }
}
