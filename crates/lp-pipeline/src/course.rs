//! Course packaging and the single-lesson operations.

use std::sync::Arc;

use lp_core::{Blob, CacheKey, CourseId, Error, Fingerprint, Result};
use lp_store::CacheWriteSet;
use tokio::task::JoinSet;

use crate::context::PipelineContext;
use crate::manifest::{CourseManifest, CourseManifestBuilder, FilePointer, LessonMetadata, Variants};
use crate::source::{Course, SourceCorpus};
use crate::stage::{self, CacheStatus, StageOutput};

/// Everything a packaged course contributes to the output.
#[derive(Debug, Clone)]
pub struct CoursePackage {
    pub course: CourseId,
    pub manifest: CourseManifest,
    /// The serialized manifest, named `<courseId>-meta.json`.
    pub meta: Blob,
    /// High- and low-quality variants of every lesson, in lesson order.
    pub artifacts: Vec<StoredArtifact>,
    pub writes: CacheWriteSet,
    /// Stage results served from the store.
    pub hits: usize,
    /// Stage results computed by the transformer.
    pub computed: usize,
}

impl CoursePackage {
    pub fn lesson_count(&self) -> usize {
        self.manifest.lessons.len()
    }
}

/// A lesson variant whose bytes live in the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Output name, e.g. `3-lq.mp4`.
    pub name: String,
    pub object: Fingerprint,
    pub key: CacheKey,
    pub filesize: u64,
}

impl StoredArtifact {
    fn of(output: &StageOutput<Blob>) -> Self {
        Self {
            name: output.value.name().to_string(),
            object: output.value.fingerprint(),
            key: output.key.clone(),
            filesize: output.value.len(),
        }
    }
}

struct LessonBuild {
    position: usize,
    metadata: LessonMetadata,
    high: StoredArtifact,
    low: StoredArtifact,
    writes: CacheWriteSet,
    hits: usize,
    computed: usize,
}

async fn package_lesson(
    ctx: &PipelineContext,
    course: &Course,
    position: usize,
) -> Result<LessonBuild> {
    let source = course.read_track(position).await?;
    let remuxed = stage::remux(ctx, &source, position).await?;
    let low = stage::low_quality(ctx, &remuxed.value, position).await?;
    let duration_seconds = stage::probe_duration(ctx, &remuxed.value).await?;

    let metadata = LessonMetadata {
        id: course.lesson_id(position),
        title: LessonMetadata::title_for(position),
        variants: Variants {
            low_quality: FilePointer::for_blob(&low.value)?,
            high_quality: FilePointer::for_blob(&remuxed.value)?,
        },
        duration_seconds,
    };

    let statuses = [remuxed.status, low.status];
    let hits = statuses.iter().filter(|s| **s == CacheStatus::Hit).count();

    Ok(LessonBuild {
        position,
        metadata,
        high: StoredArtifact::of(&remuxed),
        low: StoredArtifact::of(&low),
        writes: remuxed.writes.merged(low.writes),
        hits,
        computed: statuses.len() - hits,
    })
}

/// Package every lesson of `course_id` and assemble its manifest.
///
/// Every lesson runs as its own task; each external invocation waits for a
/// scheduler slot. When a lesson fails, the other lessons still finish (and
/// their cache entries are kept) but the course fails with the error of the
/// lowest-numbered failing lesson. No partial manifest is produced.
pub async fn package_course(
    ctx: &PipelineContext,
    corpus: &SourceCorpus,
    course_id: &CourseId,
) -> Result<CoursePackage> {
    let course = Arc::new(corpus.course(course_id).await?);
    tracing::info!(course = %course_id, lessons = course.len(), "packaging course");

    let mut tasks = JoinSet::new();
    for position in 0..course.len() {
        let ctx = ctx.clone();
        let course = Arc::clone(&course);
        tasks.spawn(async move { (position, package_lesson(&ctx, &course, position).await) });
    }

    let mut results: Vec<Option<Result<LessonBuild>>> = (0..course.len()).map(|_| None).collect();
    let mut panicked = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, result)) => results[position] = Some(result),
            Err(e) => {
                tracing::error!(course = %course_id, "lesson task failed: {e}");
                panicked.get_or_insert(Error::Internal(format!("lesson task failed: {e}")));
            }
        }
    }
    if let Some(e) = panicked {
        return Err(e);
    }

    let mut builder = CourseManifestBuilder::new(ctx.settings.build_version, course.len());
    let mut artifacts = Vec::with_capacity(course.len() * 2);
    let mut writes = CacheWriteSet::new();
    let (mut hits, mut computed) = (0, 0);

    for result in results.into_iter().flatten() {
        let lesson = result.map_err(|e| {
            tracing::error!(course = %course_id, "lesson failed: {e}");
            e
        })?;
        builder.add(lesson.position, lesson.metadata);
        artifacts.push(lesson.high);
        artifacts.push(lesson.low);
        writes.merge(lesson.writes);
        hits += lesson.hits;
        computed += lesson.computed;
    }

    let manifest = builder.build()?;
    let meta = manifest.to_blob(course_id)?;

    tracing::info!(
        course = %course_id,
        hits,
        computed,
        new_entries = writes.len(),
        new_bytes = writes.total_bytes(),
        "course packaged"
    );

    Ok(CoursePackage {
        course: course_id.clone(),
        manifest,
        meta,
        artifacts,
        writes,
        hits,
        computed,
    })
}

async fn lesson_source(
    corpus: &SourceCorpus,
    course_id: &CourseId,
    index: i64,
) -> Result<(Blob, usize)> {
    let course = corpus.course(course_id).await?;
    let position = course.position(index)?;
    Ok((course.read_track(position).await?, position))
}

/// Remux one lesson, identified by a possibly out-of-range index.
pub async fn remux_lesson(
    ctx: &PipelineContext,
    corpus: &SourceCorpus,
    course_id: &CourseId,
    index: i64,
) -> Result<StageOutput<Blob>> {
    let (source, position) = lesson_source(corpus, course_id, index).await?;
    stage::remux(ctx, &source, position).await
}

/// Produce the low-quality variant of one lesson, remuxing it first.
///
/// The returned write set covers both stages; the status is that of the
/// low-quality stage.
pub async fn low_quality_lesson(
    ctx: &PipelineContext,
    corpus: &SourceCorpus,
    course_id: &CourseId,
    index: i64,
) -> Result<StageOutput<Blob>> {
    let (source, position) = lesson_source(corpus, course_id, index).await?;
    let remuxed = stage::remux(ctx, &source, position).await?;
    let low = stage::low_quality(ctx, &remuxed.value, position).await?;
    Ok(StageOutput {
        value: low.value,
        key: low.key,
        writes: remuxed.writes.merged(low.writes),
        status: low.status,
    })
}
