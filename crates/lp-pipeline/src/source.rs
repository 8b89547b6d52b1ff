//! Reader for the on-disk source corpus.
//!
//! ```text
//! <root>/list.txt                       course IDs, one per line
//! <root>/courses/<id>/list.txt          track file names, one per line
//! <root>/courses/<id>/tracks/<file>     source audio
//! ```
//!
//! Listings are split on newlines; every line is trimmed and blank lines are
//! dropped. The corpus is never written to.

use std::path::{Path, PathBuf};

use lp_core::{Blob, CourseId, Error, LessonId, Result};

const LISTING_FILE: &str = "list.txt";
const COURSES_DIR: &str = "courses";
const TRACKS_DIR: &str = "tracks";

/// Parse a listing file: trimmed, non-blank lines in order.
pub fn parse_listing(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Handle to a source corpus directory.
#[derive(Debug, Clone)]
pub struct SourceCorpus {
    root: PathBuf,
}

impl SourceCorpus {
    /// Open the corpus rooted at `root`, which must be a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::configuration(format!(
                "corpus root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Course IDs in listing order.
    pub async fn course_ids(&self) -> Result<Vec<CourseId>> {
        let path = self.root.join(LISTING_FILE);
        let text = read_listing(&path).await?.ok_or_else(|| {
            Error::configuration(format!("corpus listing {} is missing", path.display()))
        })?;
        parse_listing(&text)
            .into_iter()
            .map(|id| validate_course_id(&id).map(|()| CourseId::new(id)))
            .collect()
    }

    /// Load the track listing of one course.
    ///
    /// A missing, empty, or all-blank listing is a configuration error.
    pub async fn course(&self, id: &CourseId) -> Result<Course> {
        validate_course_id(id.as_str())?;
        let dir = self.root.join(COURSES_DIR).join(id.as_str());
        let tracks = match read_listing(&dir.join(LISTING_FILE)).await? {
            Some(text) => parse_listing(&text),
            None => Vec::new(),
        };

        if tracks.is_empty() {
            return Err(Error::configuration(format!("course \"{id}\" has no tracks")));
        }

        Ok(Course {
            id: id.clone(),
            tracks,
            tracks_dir: dir.join(TRACKS_DIR),
        })
    }
}

async fn read_listing(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn validate_course_id(id: &str) -> Result<()> {
    if id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(Error::configuration(format!("invalid course id '{id}'")));
    }
    Ok(())
}

/// A course with a non-empty, ordered track list.
#[derive(Debug, Clone)]
pub struct Course {
    id: CourseId,
    tracks: Vec<String>,
    tracks_dir: PathBuf,
}

impl Course {
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    /// Number of lessons. Never zero.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Identifier of the lesson at `position`.
    pub fn lesson_id(&self, position: usize) -> LessonId {
        LessonId::for_position(&self.id, position)
    }

    /// Validate a requested lesson index, which may be negative.
    pub fn position(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&pos| pos < self.tracks.len())
            .ok_or_else(|| Error::Bounds {
                course: self.id.to_string(),
                index,
                count: self.tracks.len(),
            })
    }

    /// Read the source track at `position`, named after its listing entry.
    pub async fn read_track(&self, position: usize) -> Result<Blob> {
        let name = self.tracks.get(position).ok_or_else(|| Error::Bounds {
            course: self.id.to_string(),
            index: position as i64,
            count: self.tracks.len(),
        })?;
        let path = self.tracks_dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Blob::new(name.clone(), data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("track", path.display()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
