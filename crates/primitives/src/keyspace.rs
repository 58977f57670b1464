//! Logical key → record addressing, and TTL helpers shared by primitives

use redshim_core::{RecordKey, RecordMeta, RecordStore, Result, Ttl};
use redshim_engine::ShimConfig;

/// Bin holding a plain value (string, counter, list or single-bin hash)
pub const VALUE_BIN: &str = "r";

/// Namespace and base set that logical keys map into
///
/// Strings, lists and single-record hashes live in `<set>`; expanded hashes
/// add `<set>_hroot` and `<set>_hfield`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    namespace: String,
    set: String,
}

impl Keyspace {
    /// Create a keyspace
    pub fn new(namespace: impl Into<String>, set: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
        }
    }

    /// Keyspace named by a config
    pub fn from_config(config: &ShimConfig) -> Self {
        Self::new(config.namespace.as_str(), config.set.as_str())
    }

    /// Namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Base set
    pub fn set(&self) -> &str {
        &self.set
    }

    /// Record holding the plain value of a logical key
    pub fn key(&self, user_key: &[u8]) -> RecordKey {
        RecordKey::new(self.namespace.as_str(), self.set.as_str(), user_key)
    }

    /// Set holding expanded-hash roots
    pub fn root_set(&self) -> String {
        format!("{}_hroot", self.set)
    }

    /// Set holding expanded-hash field records
    pub fn field_set(&self) -> String {
        format!("{}_hfield", self.set)
    }

    /// Every set this keyspace writes to
    pub fn all_sets(&self) -> [String; 3] {
        [self.set.clone(), self.root_set(), self.field_set()]
    }
}

/// Remaining lifetime of a key, as the reference store's TTL reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// No such key (-2)
    Missing,
    /// Key never expires (-1)
    Persistent,
    /// Seconds until expiry, rounded to the nearest second
    Expires(u64),
}

impl TtlStatus {
    /// Status from record metadata
    pub fn from_meta(meta: Option<RecordMeta>) -> Self {
        match meta {
            None => TtlStatus::Missing,
            Some(RecordMeta { ttl: None, .. }) => TtlStatus::Persistent,
            Some(RecordMeta { ttl: Some(d), .. }) => {
                TtlStatus::Expires(((d.as_millis() + 500) / 1000) as u64)
            }
        }
    }

    /// Integer reply: -2, -1 or seconds remaining
    pub fn as_reply(&self) -> i64 {
        match self {
            TtlStatus::Missing => -2,
            TtlStatus::Persistent => -1,
            TtlStatus::Expires(secs) => i64::try_from(*secs).unwrap_or(i64::MAX),
        }
    }
}

/// TTL of one record
pub(crate) fn ttl_of(store: &dyn RecordStore, key: &RecordKey) -> Result<TtlStatus> {
    Ok(TtlStatus::from_meta(store.exists(key)?))
}

/// Set a record's expiry; `secs == 0` removes it immediately
///
/// Returns whether the record existed.
pub(crate) fn expire(store: &dyn RecordStore, key: &RecordKey, secs: u32) -> Result<bool> {
    if secs == 0 {
        store.remove(key)
    } else {
        store.touch(key, Ttl::Seconds(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_derived_sets() {
        let ks = Keyspace::new("test", "redis");
        assert_eq!(ks.root_set(), "redis_hroot");
        assert_eq!(ks.field_set(), "redis_hfield");
        assert_eq!(ks.key(b"k"), RecordKey::new("test", "redis", b"k"));
    }

    #[test]
    fn test_ttl_rounding() {
        let meta = |ms| {
            Some(RecordMeta {
                generation: 1,
                ttl: Some(Duration::from_millis(ms)),
            })
        };
        assert_eq!(TtlStatus::from_meta(meta(1999)), TtlStatus::Expires(2));
        assert_eq!(TtlStatus::from_meta(meta(1400)), TtlStatus::Expires(1));
        assert_eq!(TtlStatus::from_meta(meta(999)), TtlStatus::Expires(1));
    }

    #[test]
    fn test_ttl_replies() {
        assert_eq!(TtlStatus::from_meta(None).as_reply(), -2);
        let persistent = Some(RecordMeta {
            generation: 1,
            ttl: None,
        });
        assert_eq!(TtlStatus::from_meta(persistent).as_reply(), -1);
        assert_eq!(TtlStatus::Expires(30).as_reply(), 30);
    }
}
