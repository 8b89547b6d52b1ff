//! lp-core: shared types, errors, configuration, and the fingerprint engine.
//!
//! This crate is the foundational dependency for all other lp-* crates,
//! providing the unified error type, course/lesson identifiers, the [`Blob`]
//! value passed between stages, content fingerprints, and the traits behind
//! which the external transcoding tools sit.

pub mod blob;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use blob::Blob;
pub use engine::{DurationProbe, TransformSpec, Transformer};
pub use error::{Error, Result};
pub use fingerprint::{hash_call, hash_content, CacheKey, Fingerprint};
pub use ids::*;
pub use media::MimeType;
