//! Record addressing
//!
//! A record is addressed by `(namespace, set, user_key)`. The namespace and
//! set are short identifiers chosen by configuration; the user key is an
//! arbitrary byte string (binary keys are allowed).
//!
//! Ordering is namespace → set → user_key, so a `BTreeMap<RecordKey, _>`
//! keeps each set contiguous for scans.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one physical record
///
/// # Examples
///
/// ```
/// use redshim_core::RecordKey;
///
/// let key = RecordKey::new("test", "redis", "myKey");
/// assert_eq!(key.set, "redis");
/// assert!(key.in_set("test", "redis"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Namespace (top-level storage partition)
    pub namespace: String,
    /// Set within the namespace
    pub set: String,
    /// User-defined key bytes
    pub user_key: Vec<u8>,
}

impl RecordKey {
    /// Create a new record key
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        user_key: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            user_key: user_key.as_ref().to_vec(),
        }
    }

    /// Whether this key belongs to the given namespace and set
    pub fn in_set(&self, namespace: &str, set: &str) -> bool {
        self.namespace == namespace && self.set == set
    }

    /// Lossy UTF-8 rendering of the user key (for logs and errors)
    pub fn user_key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.user_key).into_owned()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}:{}",
            self.namespace,
            self.set,
            String::from_utf8_lossy(&self.user_key)
        )
    }
}
