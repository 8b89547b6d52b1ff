//! # lp-pipeline
//!
//! Incremental, content-addressed build of course packages.
//!
//! This crate provides:
//!
//! - **[`Scheduler`]** -- FIFO admission of external tool invocations with a
//!   fixed concurrency bound.
//! - **[`PipelineContext`]** -- the store, collaborators, scheduler and build
//!   settings handed to every stage.
//! - **Stages** ([`stage`]) -- memoized remux and low-quality transforms that
//!   return their value together with the cache entries they created.
//! - **[`SourceCorpus`]** -- reader for the on-disk corpus listings.
//! - **Manifests** ([`manifest`]) -- file pointers, course and corpus manifests.
//! - **[`package_course`]** / **[`package_corpus`]** -- the course and corpus
//!   packaging operations.

pub mod context;
pub mod corpus;
pub mod course;
pub mod manifest;
pub mod scheduler;
pub mod source;
pub mod stage;

pub use context::{BuildSettings, PipelineContext};
pub use corpus::{package_corpus, CorpusBuild, CourseFailure, ALL_COURSES_FILE};
pub use course::{low_quality_lesson, package_course, remux_lesson, CoursePackage, StoredArtifact};
pub use manifest::{CorpusManifest, CourseEntry, CourseManifest, FilePointer, LessonMetadata};
pub use scheduler::Scheduler;
pub use source::{Course, SourceCorpus};
pub use stage::{CacheStatus, StageKind, StageOutput};
