//! Memoized pipeline stages.
//!
//! A stage's cache key is the fingerprint of its name and its input content,
//! so a stage runs its external transformation at most once per distinct
//! input for the lifetime of the store. Results are written through to the
//! store and also returned as a [`CacheWriteSet`] so callers can account for
//! what the call produced.

use std::fmt;

use lp_core::{hash_call, Blob, CacheKey, Error, Result, TransformSpec};
use lp_store::CacheWriteSet;

use crate::context::PipelineContext;

/// The memoized transformations of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Metadata-stripped high-quality mp4.
    Remux,
    /// Mono low-bitrate mp4 derived from the remux output.
    LowQuality,
}

impl StageKind {
    /// Stage name as it enters the cache key. Changing it invalidates the cache.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remux => "remux",
            Self::LowQuality => "lowQualityTrack",
        }
    }

    pub fn spec(&self) -> TransformSpec {
        match self {
            Self::Remux => TransformSpec::Remux,
            Self::LowQuality => TransformSpec::LowQuality,
        }
    }

    /// File name of the stage output for the lesson at `position`.
    pub fn output_name(&self, position: usize) -> String {
        match self {
            Self::Remux => format!("{position}.mp4"),
            Self::LowQuality => format!("{position}-lq.mp4"),
        }
    }

    /// Cache key of this stage applied to `input`.
    pub fn cache_key(&self, input: &Blob) -> CacheKey {
        hash_call(self.name(), &[&input.fingerprint()]).cache_key()
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a stage result came from the store or from a fresh computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Computed,
}

/// A stage result plus the cache entries the call created.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    /// Store entry holding the value.
    pub key: CacheKey,
    /// Empty on a cache hit; exactly one entry after a computation.
    pub writes: CacheWriteSet,
    pub status: CacheStatus,
}

impl<T> StageOutput<T> {
    pub fn is_hit(&self) -> bool {
        self.status == CacheStatus::Hit
    }
}

/// Blobs at least this large are hashed on the blocking thread pool.
pub const BLOCKING_HASH_THRESHOLD: u64 = 64 * 1024;

/// Return `blob` with its fingerprint computed.
///
/// Large blobs are hashed with `spawn_blocking` so SHA-256 never stalls the
/// async workers.
pub async fn hashed(blob: Blob) -> Result<Blob> {
    if blob.is_hashed() || blob.len() < BLOCKING_HASH_THRESHOLD {
        blob.fingerprint();
        return Ok(blob);
    }
    tokio::task::spawn_blocking(move || {
        blob.fingerprint();
        blob
    })
    .await
    .map_err(|e| Error::Internal(format!("hashing task failed: {e}")))
}

/// Run `kind` on `input` for the lesson at `position`, consulting the store first.
///
/// The returned blob already carries its fingerprint.
pub async fn run(
    ctx: &PipelineContext,
    kind: StageKind,
    input: &Blob,
    position: usize,
) -> Result<StageOutput<Blob>> {
    let input = hashed(input.clone()).await?;
    let key = kind.cache_key(&input);
    let output_name = kind.output_name(position);

    match ctx.store.read(&key).await {
        Ok(data) => {
            tracing::info!(stage = kind.name(), lesson = position, key = %key, "cache hit");
            return Ok(StageOutput {
                value: hashed(Blob::new(output_name, data)).await?,
                key,
                writes: CacheWriteSet::new(),
                status: CacheStatus::Hit,
            });
        }
        Err(Error::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    tracing::info!(stage = kind.name(), lesson = position, key = %key, "cache miss; computing");
    let label = format!("{kind} {output_name}");
    let produced = ctx
        .scheduler
        .run(
            &label,
            ctx.transformer.transform(&input, kind.spec(), &output_name),
        )
        .await?;
    let value = hashed(produced.relabel(output_name)).await?;

    ctx.store.write(&key, value.data().clone()).await?;
    tracing::debug!(stage = kind.name(), key = %key, bytes = value.len(), "cached");

    Ok(StageOutput {
        writes: CacheWriteSet::single(key.clone(), value.data().clone()),
        key,
        value,
        status: CacheStatus::Computed,
    })
}

/// Remux a source track into the lesson's high-quality variant.
pub async fn remux(ctx: &PipelineContext, input: &Blob, position: usize) -> Result<StageOutput<Blob>> {
    run(ctx, StageKind::Remux, input, position).await
}

/// Derive the lesson's low-quality variant from its remux output.
pub async fn low_quality(
    ctx: &PipelineContext,
    remuxed: &Blob,
    position: usize,
) -> Result<StageOutput<Blob>> {
    run(ctx, StageKind::LowQuality, remuxed, position).await
}

/// Measure the duration of `blob`. Not cached; admitted by the scheduler.
pub async fn probe_duration(ctx: &PipelineContext, blob: &Blob) -> Result<f64> {
    let label = format!("probe {}", blob.name());
    ctx.scheduler.run(&label, ctx.probe.duration(blob)).await
}
