//! Corpus packaging: every course, one output tree, one corpus manifest.

use std::collections::BTreeSet;

use lp_core::config::FailurePolicy;
use lp_core::{CacheKey, CourseId, Error, Result};
use lp_store::OutputTree;

use crate::context::PipelineContext;
use crate::course::package_course;
use crate::manifest::{
    to_canonical_json, CorpusManifest, CorpusManifestBuilder, CourseEntry, FilePointer,
};
use crate::source::SourceCorpus;

/// Name of the corpus manifest at the root of the output tree.
pub const ALL_COURSES_FILE: &str = "all-courses.json";

/// A course left out of the build under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct CourseFailure {
    pub course: CourseId,
    pub error: Error,
}

/// The result of packaging a whole corpus.
#[derive(Debug)]
pub struct CorpusBuild {
    pub manifest: CorpusManifest,
    /// Every artifact of every successful course, plus `all-courses.json`.
    /// Lesson variants are referenced by cache key, not held in memory.
    pub tree: OutputTree,
    /// Keys of the cache entries this build created. Their payloads are
    /// already in the store.
    pub new_entries: BTreeSet<CacheKey>,
    pub failures: Vec<CourseFailure>,
    pub hits: usize,
    pub computed: usize,
}

/// Package every course of `corpus`, one course at a time.
///
/// A failed course is skipped or aborts the build according to
/// `ctx.settings.on_course_failure`. Skipped courses contribute nothing to the
/// output tree or the manifest.
pub async fn package_corpus(ctx: &PipelineContext, corpus: &SourceCorpus) -> Result<CorpusBuild> {
    let course_ids = corpus.course_ids().await?;
    tracing::info!(
        courses = course_ids.len(),
        concurrency = ctx.scheduler.capacity(),
        "packaging corpus"
    );

    let mut builder =
        CorpusManifestBuilder::new(ctx.settings.build_version, ctx.settings.cas_base_url.clone());
    let mut tree = OutputTree::new();
    let mut new_entries = BTreeSet::new();
    let mut failures = Vec::new();
    let (mut hits, mut computed) = (0, 0);

    for (position, course_id) in course_ids.iter().enumerate() {
        let package = match package_course(ctx, corpus, course_id).await {
            Ok(package) => package,
            Err(e) => match ctx.settings.on_course_failure {
                FailurePolicy::Abort => {
                    tracing::error!(course = %course_id, "course failed; aborting build: {e}");
                    return Err(e);
                }
                FailurePolicy::Skip => {
                    tracing::warn!(course = %course_id, kind = e.kind(), "skipping course: {e}");
                    failures.push(CourseFailure {
                        course: course_id.clone(),
                        error: e,
                    });
                    continue;
                }
            },
        };

        for artifact in &package.artifacts {
            tree.place_stored(artifact.object.clone(), artifact.key.clone());
        }
        tree.place(&package.meta);

        builder.add(
            position,
            CourseEntry {
                id: package.course.clone(),
                meta: FilePointer::for_blob(&package.meta)?,
                lesson_count: package.lesson_count(),
            },
        );
        new_entries.extend(package.writes.into_keys());
        hits += package.hits;
        computed += package.computed;
    }

    let manifest = builder.build()?;
    tree.insert_document(ALL_COURSES_FILE, to_canonical_json(&manifest)?);

    tracing::info!(
        courses = manifest.courses.len(),
        skipped = failures.len(),
        objects = tree.len(),
        new_entries = new_entries.len(),
        hits,
        computed,
        "corpus packaged"
    );

    Ok(CorpusBuild {
        manifest,
        tree,
        new_entries,
        failures,
        hits,
        computed,
    })
}
