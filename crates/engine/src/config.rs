//! Emulation configuration via `redshim.toml`
//!
//! Every setting has a default, so an empty file (or no file at all) gives
//! a working setup: namespace `test`, set `redis`, expanded-map hashes with
//! a 31-day TTL.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use redshim_core::{Error, Result, Ttl};
use redshim_storage::StoreConfig;

use crate::retry::RetryConfig;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "redshim.toml";

/// Default hash lifetime: 31 days
pub const DEFAULT_HASH_TTL_SECS: u32 = 31 * 24 * 60 * 60;

/// How a logical hash is laid out in records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategyKind {
    /// Root record plus one record per field
    Expanded,
    /// Whole hash in one map-valued bin
    SingleBin,
    /// One bin per field in one record
    Direct,
}

/// What happens to field records orphaned by a hash deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Leave them to expire; reads never see them because their suffix is dead
    #[default]
    TtlOnly,
    /// Additionally delete up to `limit` of them when the root is deleted
    BestEffort {
        /// Maximum field records removed per deletion
        limit: usize,
    },
}

/// Emulation configuration loaded from `redshim.toml`.
///
/// # Example
///
/// ```toml
/// namespace = "test"
/// set = "redis"
/// hash_strategy = "expanded"
/// hash_ttl_secs = 2678400
///
/// [retry]
/// max_retries = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// Record store namespace
    pub namespace: String,
    /// Base set; expanded hashes also use `<set>_hroot` and `<set>_hfield`
    pub set: String,
    /// `"expanded"`, `"single_bin"` or `"direct"`
    pub hash_strategy: String,
    /// Default hash TTL in seconds; 0 = never expire
    pub hash_ttl_secs: u32,
    /// Wait after losing a root-creation race before re-reading the root
    pub root_backoff_ms: u64,
    /// `"ttl_only"` or `"best_effort"`
    pub orphan_cleanup: String,
    /// Field records removed per deletion under `"best_effort"`
    pub orphan_cleanup_limit: usize,
    /// Backoff for generation-checked read-modify-write loops
    pub retry: RetryConfig,
    /// Settings for the embedded in-memory store
    pub store: StoreConfig,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            namespace: "test".to_string(),
            set: "redis".to_string(),
            hash_strategy: "expanded".to_string(),
            hash_ttl_secs: DEFAULT_HASH_TTL_SECS,
            root_backoff_ms: 50,
            orphan_cleanup: "ttl_only".to_string(),
            orphan_cleanup_limit: 1000,
            retry: RetryConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ShimConfig {
    /// Parse the hash strategy name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not one of the three strategies.
    pub fn hash_strategy_kind(&self) -> Result<HashStrategyKind> {
        match self.hash_strategy.as_str() {
            "expanded" => Ok(HashStrategyKind::Expanded),
            "single_bin" => Ok(HashStrategyKind::SingleBin),
            "direct" => Ok(HashStrategyKind::Direct),
            other => Err(Error::invalid_input(format!(
                "Invalid hash_strategy '{}' in {}. Expected \"expanded\", \"single_bin\" or \"direct\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Parse the orphan cleanup policy.
    pub fn orphan_policy(&self) -> Result<OrphanPolicy> {
        match self.orphan_cleanup.as_str() {
            "ttl_only" => Ok(OrphanPolicy::TtlOnly),
            "best_effort" => Ok(OrphanPolicy::BestEffort {
                limit: self.orphan_cleanup_limit,
            }),
            other => Err(Error::invalid_input(format!(
                "Invalid orphan_cleanup '{}' in {}. Expected \"ttl_only\" or \"best_effort\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Default hash TTL as a write TTL
    pub fn hash_ttl(&self) -> Ttl {
        match self.hash_ttl_secs {
            0 => Ttl::Never,
            secs => Ttl::Seconds(secs),
        }
    }

    /// Root-creation race backoff
    pub fn root_backoff(&self) -> Duration {
        Duration::from_millis(self.root_backoff_ms)
    }

    /// Validate every enumerated setting.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || self.set.is_empty() {
            return Err(Error::invalid_input(format!(
                "namespace and set must be non-empty in {}",
                CONFIG_FILE_NAME
            )));
        }
        self.hash_strategy_kind()?;
        self.orphan_policy()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Redshim configuration
#
# Record store namespace and base set
namespace = "test"
set = "redis"

# Hash layout: "expanded" (default), "single_bin" or "direct"
#   "expanded"   = root record + one record per field, scales to large hashes
#   "single_bin" = whole hash in one map bin, bounded by the record size limit
#   "direct"     = one bin per field, field names limited to bin-name length
hash_strategy = "expanded"

# Default hash TTL in seconds (31 days); 0 = never expire
hash_ttl_secs = 2678400

# Wait after losing a root-creation race before re-reading (milliseconds)
root_backoff_ms = 50

# Field records orphaned by a hash deletion: "ttl_only" or "best_effort"
orphan_cleanup = "ttl_only"
orphan_cleanup_limit = 1000

[retry]
max_retries = 5
base_delay_ms = 2
max_delay_ms = 100

[store]
# TTL for writes using the namespace default; 0 = never expire
default_ttl_secs = 0
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_input(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ShimConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_input(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
