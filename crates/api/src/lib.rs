//! Public API layer for Redshim
//!
//! This crate is the command surface callers program against:
//! - **Client**: one method per reference-store command, immediate mode
//! - **Pipeline**: multi/exec and pipeline, capturing replies in order
//! - **Reply**: the value a buffered command leaves in the exec result
//!
//! ## Architectural Invariant
//!
//! Every client command **desugars to exactly one primitive call**
//! (see the table in [`client`]). Buffering changes what is returned, never
//! what is executed: a command issued inside `multi` has the same effect,
//! at the same moment, as it would outside.
//!
//! ## Quick Start
//!
//! ```
//! use redshim_api::Client;
//! use redshim_engine::ShimConfig;
//!
//! let client = Client::in_memory(&ShimConfig::default()).unwrap();
//! client.set("greeting", "hello").unwrap();
//! assert_eq!(client.get("greeting").unwrap(), Some(b"hello".to_vec()));
//! assert_eq!(client.incr("visits").unwrap(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod client;
pub mod reply;

pub use buffer::{BufferState, CommandBuffer};
pub use client::{Client, Pipeline};
pub use reply::Reply;
