//! Manifest documents and their builders.
//!
//! Manifests are serialized as compact JSON with keys in struct declaration
//! order, so identical builds produce byte-identical documents and therefore
//! identical fingerprints.

use bytes::Bytes;
use lp_core::{Blob, CourseId, Error, Fingerprint, LessonId, MimeType, Result};
use serde::{Deserialize, Serialize};

/// Reference to a content-addressed object in the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePointer {
    pub object: Fingerprint,
    pub filesize: u64,
    pub mime_type: MimeType,
}

impl FilePointer {
    /// Pointer to `blob`, typed from its file name.
    pub fn for_blob(blob: &Blob) -> Result<Self> {
        Ok(Self {
            object: blob.fingerprint(),
            filesize: blob.len(),
            mime_type: MimeType::for_file_name(blob.name())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variants {
    pub low_quality: FilePointer,
    pub high_quality: FilePointer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMetadata {
    pub id: LessonId,
    pub title: String,
    pub variants: Variants,
    pub duration_seconds: f64,
}

impl LessonMetadata {
    /// Display title of the lesson at a 0-based position.
    pub fn title_for(position: usize) -> String {
        format!("Lesson {}", position + 1)
    }
}

/// Per-course document, published as `<courseId>-meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseManifest {
    pub build_version: u32,
    pub lessons: Vec<LessonMetadata>,
}

impl CourseManifest {
    /// File name of the serialized manifest for `course`.
    pub fn file_name(course: &CourseId) -> String {
        format!("{course}-meta.json")
    }

    /// The manifest as a named blob ready for placement.
    pub fn to_blob(&self, course: &CourseId) -> Result<Blob> {
        Ok(Blob::new(Self::file_name(course), to_canonical_json(self)?))
    }
}

/// One course as listed in the corpus manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEntry {
    pub id: CourseId,
    pub meta: FilePointer,
    pub lesson_count: usize,
}

/// The top-level `all-courses.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusManifest {
    pub build_version: u32,
    #[serde(rename = "casBaseURL")]
    pub cas_base_url: String,
    pub courses: Vec<CourseEntry>,
}

/// Serialize a manifest to compact JSON.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Collects lessons in completion order and emits them in index order.
#[derive(Debug)]
pub struct CourseManifestBuilder {
    build_version: u32,
    expected: usize,
    lessons: Vec<(usize, LessonMetadata)>,
}

impl CourseManifestBuilder {
    pub fn new(build_version: u32, expected: usize) -> Self {
        Self {
            build_version,
            expected,
            lessons: Vec::with_capacity(expected),
        }
    }

    pub fn add(&mut self, position: usize, lesson: LessonMetadata) -> &mut Self {
        self.lessons.push((position, lesson));
        self
    }

    /// Sort by position and check that every position `0..expected` appears
    /// exactly once.
    pub fn build(mut self) -> Result<CourseManifest> {
        self.lessons.sort_by_key(|(pos, _)| *pos);

        if self.lessons.len() != self.expected
            || self
                .lessons
                .iter()
                .enumerate()
                .any(|(i, (pos, _))| i != *pos)
        {
            let positions: Vec<usize> = self.lessons.iter().map(|(p, _)| *p).collect();
            return Err(Error::Internal(format!(
                "expected lessons 0..{} but got positions {positions:?}",
                self.expected
            )));
        }

        Ok(CourseManifest {
            build_version: self.build_version,
            lessons: self.lessons.into_iter().map(|(_, l)| l).collect(),
        })
    }
}

/// Collects course entries and emits them in corpus order.
///
/// Positions need not be contiguous: skipped courses leave gaps.
#[derive(Debug)]
pub struct CorpusManifestBuilder {
    build_version: u32,
    cas_base_url: String,
    courses: Vec<(usize, CourseEntry)>,
}

impl CorpusManifestBuilder {
    pub fn new(build_version: u32, cas_base_url: impl Into<String>) -> Self {
        Self {
            build_version,
            cas_base_url: cas_base_url.into(),
            courses: Vec::new(),
        }
    }

    pub fn add(&mut self, position: usize, entry: CourseEntry) -> &mut Self {
        self.courses.push((position, entry));
        self
    }

    pub fn build(mut self) -> Result<CorpusManifest> {
        self.courses.sort_by_key(|(pos, _)| *pos);
        if let Some(dup) = self.courses.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(Error::Internal(format!(
                "course position {} added twice",
                dup[0].0
            )));
        }

        Ok(CorpusManifest {
            build_version: self.build_version,
            cas_base_url: self.cas_base_url,
            courses: self.courses.into_iter().map(|(_, c)| c).collect(),
        })
    }
}
