//! In-memory store configuration

use redshim_core::{Limits, Timestamp, Ttl};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of a `MemoryRecordStore`
///
/// Appears as the `[store]` table of `redshim.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// TTL applied by `Ttl::NamespaceDefault` writes; 0 means never expire
    pub default_ttl_secs: u32,
    /// Record-size and bin-name limits
    pub limits: Limits,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 0,
            limits: Limits::default(),
        }
    }
}

impl StoreConfig {
    /// Resolve a write's TTL into an absolute deadline
    ///
    /// `current` is the existing record's deadline, used by `Ttl::Unchanged`.
    pub(crate) fn deadline(
        &self,
        ttl: Ttl,
        current: Option<Option<Timestamp>>,
        now: Timestamp,
    ) -> Option<Timestamp> {
        match ttl {
            Ttl::Never => None,
            Ttl::Seconds(secs) => Some(now.saturating_add(Duration::from_secs(u64::from(secs)))),
            Ttl::NamespaceDefault => self.default_deadline(now),
            Ttl::Unchanged => match current {
                Some(existing) => existing,
                None => self.default_deadline(now),
            },
        }
    }

    fn default_deadline(&self, now: Timestamp) -> Option<Timestamp> {
        match self.default_ttl_secs {
            0 => None,
            secs => Some(now.saturating_add(Duration::from_secs(u64::from(secs)))),
        }
    }
}
