//! Command-level compatibility suite
//!
//! Each module replays one group of reference-store scenarios against the
//! client and checks the replies a reference-store client would see.

#[path = "../common/mod.rs"]
mod common;

mod contention;
mod hashes;
mod lists;
mod strings;
mod transactions;
