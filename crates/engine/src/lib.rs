//! Emulation engine for Redshim
//!
//! The pieces every data-structure strategy shares:
//! - codec: binary-safe byte strings in text bins
//! - retry: the increment-or-create protocol and race retry loop
//! - config: `redshim.toml` settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod retry;

pub use codec::Scalar;
pub use config::{HashStrategyKind, OrphanPolicy, ShimConfig, CONFIG_FILE_NAME};
pub use retry::{
    increment_numeric, increment_or_create, parse_integer_text, promote_numeric_text,
    retry_on_race, Increment, RetryConfig,
};
