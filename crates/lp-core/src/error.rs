//! Unified error type for the lessonpack pipeline.
//!
//! Every crate funnels its failures into [`Error`]. The variants mirror the
//! units a failure is fatal for: a whole course (configuration), a single
//! request (bounds), or a single artifact (format, transformation).

use std::fmt;

/// Unified error type covering all failure modes in lessonpack.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A course listing is missing or empty, or the configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A lesson index outside `[0, count)` was requested.
    #[error("lesson index {index} out of bounds for course \"{course}\" ({count} tracks)")]
    Bounds {
        /// Course the lesson was requested from.
        course: String,
        /// The requested (possibly negative) index.
        index: i64,
        /// Number of tracks in the course.
        count: usize,
    },

    /// An artifact's file extension has no registered MIME mapping.
    #[error("Unsupported format: {name}")]
    UnsupportedFormat {
        /// Name of the artifact that could not be typed.
        name: String,
    },

    /// An external tool (ffmpeg, ffprobe) reported a failure.
    #[error("Transformation error [{tool}]: {message}")]
    Transformation {
        /// Name of the tool or stage that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "cache entry", "course").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A JSON document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Transformation`].
    pub fn transformation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transformation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Short, stable label for the error kind, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Bounds { .. } => "bounds",
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::Transformation { .. } => "transformation",
            Error::NotFound { .. } => "not_found",
            Error::Io { .. } => "io",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_display() {
        let err = Error::configuration("course \"spanish\" has no tracks");
        assert_eq!(
            err.to_string(),
            "Configuration error: course \"spanish\" has no tracks"
        );
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn bounds_display() {
        let err = Error::Bounds {
            course: "music".into(),
            index: -1,
            count: 3,
        };
        assert_eq!(
            err.to_string(),
            "lesson index -1 out of bounds for course \"music\" (3 tracks)"
        );
        assert_eq!(err.kind(), "bounds");
    }

    #[test]
    fn unsupported_format_display() {
        let err = Error::UnsupportedFormat {
            name: "track.wav".into(),
        };
        assert_eq!(err.to_string(), "Unsupported format: track.wav");
    }

    #[test]
    fn transformation_display() {
        let err = Error::transformation("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Transformation error [ffmpeg]: exit code 1");
        assert_eq!(err.kind(), "transformation");
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("cache entry", "cache-abc");
        assert_eq!(err.to_string(), "cache entry not found: cache-abc");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn serialization_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(parse_err);
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::Internal("boom".into()))
        }
        assert!(err_fn().is_err());
    }
}
