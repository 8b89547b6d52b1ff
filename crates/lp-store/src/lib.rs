//! # lp-store
//!
//! Content-addressed storage for the lessonpack pipeline.
//!
//! This crate provides:
//!
//! - **[`ContentStore`]** -- the key/value interface every stage consults
//!   before invoking an external tool, with a filesystem backend
//!   ([`FsStore`]) and an in-memory backend ([`MemoryStore`]).
//! - **[`CacheWriteSet`]** -- the entries a single operation added to the
//!   store, merged upward by key union.
//! - **[`OutputTree`]** -- the final artifact tree, sharded by the first two
//!   hex characters of each object's fingerprint.

pub mod cache;
pub mod output;
pub mod store;

pub use cache::CacheWriteSet;
pub use output::{prepare_output_dir, OutputTree};
pub use store::{ContentStore, FsStore, MemoryStore};
