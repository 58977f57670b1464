//! TTL (Time-To-Live) index for efficient expiration cleanup
//!
//! This module provides TTLIndex that enables efficient queries for expired
//! records without scanning the entire data store:
//! - Maps expiry deadline → Set<RecordKey> using BTreeMap for sorted order
//! - find_expired() returns all keys expired at a given timestamp
//! - O(expired count) instead of O(total data)

use redshim_core::{RecordKey, Timestamp};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// TTL index: expiry deadline → record keys
#[derive(Debug, Default)]
pub struct TTLIndex {
    index: BTreeMap<Timestamp, FxHashSet<RecordKey>>,
}

impl TTLIndex {
    /// Create a new empty TTLIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Add key to TTL index with given expiry deadline
    pub fn insert(&mut self, expires_at: Timestamp, key: RecordKey) {
        self.index.entry(expires_at).or_default().insert(key);
    }

    /// Remove key from TTL index at given expiry deadline
    ///
    /// If the set becomes empty, removes the timestamp entry entirely.
    pub fn remove(&mut self, expires_at: Timestamp, key: &RecordKey) {
        if let Some(keys) = self.index.get_mut(&expires_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&expires_at);
            }
        }
    }

    /// Find all keys whose deadline is at or before `now`
    pub fn find_expired(&self, now: Timestamp) -> Vec<RecordKey> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the total number of keys in the index
    pub fn len(&self) -> usize {
        self.index.values().map(|keys| keys.len()).sum()
    }
}
