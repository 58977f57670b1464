//! Write policies
//!
//! Every write to the record store carries a [`WritePolicy`]: what to do when
//! the record already exists (or doesn't), an optional expected generation,
//! and the TTL to apply. These are the only concurrency primitives the upper
//! layers get; everything else is built from them.

use std::time::Duration;

/// Behavior of a write relative to the record's existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordExistsAction {
    /// Create or merge given bins into the existing record
    #[default]
    Update,
    /// Merge into an existing record; fails with `RecordNotFound` if absent
    UpdateOnly,
    /// Create or replace all bins of the existing record
    Replace,
    /// Replace an existing record; fails with `RecordNotFound` if absent
    ReplaceOnly,
    /// Create only; fails with `RecordExists` if present
    CreateOnly,
}

impl RecordExistsAction {
    /// Whether the write requires the record to already exist
    pub fn requires_existing(&self) -> bool {
        matches!(
            self,
            RecordExistsAction::UpdateOnly | RecordExistsAction::ReplaceOnly
        )
    }

    /// Whether the write discards bins it doesn't name
    pub fn replaces(&self) -> bool {
        matches!(
            self,
            RecordExistsAction::Replace | RecordExistsAction::ReplaceOnly
        )
    }
}

/// Generation check applied before a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    /// No check
    #[default]
    None,
    /// Write only if the stored generation equals the given one
    ExpectEqual(u32),
}

/// Time to live applied by a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the store's namespace default
    #[default]
    NamespaceDefault,
    /// Never expire
    Never,
    /// Expire after the given number of seconds
    Seconds(u32),
    /// Keep the record's current expiry
    Unchanged,
}

impl Ttl {
    /// TTL from a duration, rounded down to whole seconds
    pub fn from_duration(duration: Duration) -> Self {
        Ttl::Seconds(u32::try_from(duration.as_secs()).unwrap_or(u32::MAX))
    }
}

/// Policy attached to every write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WritePolicy {
    /// Existence behavior
    pub exists: RecordExistsAction,
    /// Generation check
    pub generation: GenerationPolicy,
    /// TTL to apply
    pub ttl: Ttl,
}

impl WritePolicy {
    /// Create-or-merge with namespace default TTL
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-only write
    pub fn create_only() -> Self {
        Self {
            exists: RecordExistsAction::CreateOnly,
            ..Self::default()
        }
    }

    /// Merge into existing record only
    pub fn update_only() -> Self {
        Self {
            exists: RecordExistsAction::UpdateOnly,
            ..Self::default()
        }
    }

    /// Create or replace the whole record
    pub fn replace() -> Self {
        Self {
            exists: RecordExistsAction::Replace,
            ..Self::default()
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Require the stored generation to equal `generation`
    pub fn expect_generation(mut self, generation: u32) -> Self {
        self.generation = GenerationPolicy::ExpectEqual(generation);
        self
    }

    /// Set the existence behavior
    pub fn with_exists(mut self, exists: RecordExistsAction) -> Self {
        self.exists = exists;
        self
    }
}
