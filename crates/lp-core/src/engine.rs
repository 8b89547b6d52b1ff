//! Interfaces of the external collaborators the pipeline drives.
//!
//! The pipeline treats transcoding and duration probing as black boxes behind
//! [`Transformer`] and [`DurationProbe`]. `lp-av` implements both on top of
//! ffmpeg/ffprobe; tests substitute in-process fakes.

use std::fmt;

use async_trait::async_trait;

use crate::blob::Blob;
use crate::error::Result;

/// The transformations the pipeline knows how to request.
///
/// Codec parameters behind each variant are fixed by the implementation and
/// do not appear in cache keys; changing them requires a build version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformSpec {
    /// Copy the audio stream into an mp4 container with all metadata stripped.
    Remux,
    /// Downsample to a mono, low-bitrate AAC track in an mp4 container.
    LowQuality,
}

impl fmt::Display for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remux => write!(f, "remux"),
            Self::LowQuality => write!(f, "low-quality"),
        }
    }
}

/// Executes one transformation of an input blob into an output blob.
///
/// Implementations must be safe to share across threads (`Send + Sync`) and
/// deterministic for a given input; the pipeline caches their results forever.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Human-readable name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Produce the output of `spec` applied to `input`, named `output_name`.
    ///
    /// Failures are reported as [`crate::Error::Transformation`] and are not
    /// retried by the caller.
    async fn transform(&self, input: &Blob, spec: TransformSpec, output_name: &str)
        -> Result<Blob>;
}

/// Measures the playback duration of a media blob.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Human-readable name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Duration in seconds. Never negative.
    async fn duration(&self, blob: &Blob) -> Result<f64>;
}
