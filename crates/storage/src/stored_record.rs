//! Storage-layer record wrapper with expiry support
//!
//! The contract type `Record` reports a *remaining* TTL, which is a property
//! of the moment it is read. The storage layer instead keeps an absolute
//! deadline so expiry can be indexed and checked without a clock per record.

use std::time::Duration;

use redshim_core::{BinMap, Record, RecordMeta, Timestamp};

/// A stored record with optional expiry deadline
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Bin values
    bins: BinMap,
    /// Write generation
    generation: u32,
    /// Absolute expiry deadline; `None` never expires
    expires_at: Option<Timestamp>,
}

impl StoredRecord {
    /// Create a new stored record
    pub fn new(bins: BinMap, generation: u32, expires_at: Option<Timestamp>) -> Self {
        StoredRecord {
            bins,
            generation,
            expires_at,
        }
    }

    /// Get the bins
    #[inline]
    pub fn bins(&self) -> &BinMap {
        &self.bins
    }

    /// Get the generation
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Get the expiry deadline
    #[inline]
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Check if this record has expired at `now`
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(deadline) => !now.is_before(deadline),
            None => false,
        }
    }

    /// Remaining TTL at `now`
    pub fn remaining_ttl(&self, now: Timestamp) -> Option<Duration> {
        self.expires_at.map(|deadline| deadline.remaining_from(now))
    }

    /// Contract view, optionally projected to a subset of bins
    pub fn to_record(&self, projection: Option<&[&str]>, now: Timestamp) -> Record {
        let bins = match projection {
            Some(names) => self
                .bins
                .iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => self.bins.clone(),
        };
        Record {
            bins,
            generation: self.generation,
            ttl: self.remaining_ttl(now),
        }
    }

    /// Metadata view
    pub fn meta(&self, now: Timestamp) -> RecordMeta {
        RecordMeta {
            generation: self.generation,
            ttl: self.remaining_ttl(now),
        }
    }
}

/// Generation following `current`; never 0 so a fresh record is distinguishable
pub(crate) fn next_generation(current: u32) -> u32 {
    match current.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}
