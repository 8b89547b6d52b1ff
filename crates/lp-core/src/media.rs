//! MIME types for the artifacts the pipeline emits.
//!
//! Every file pointer in a manifest carries a MIME type
//! derived from the artifact's file extension. Extensions without a mapping
//! are rejected rather than guessed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// MIME types known to the manifest builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "audio/mp4")]
    AudioMp4,
    #[serde(rename = "audio/mpeg")]
    AudioMpeg,
    #[serde(rename = "application/json")]
    Json,
}

impl MimeType {
    /// Look up the MIME type for a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4a" => Some(Self::AudioMp4),
            "mp3" => Some(Self::AudioMpeg),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Look up the MIME type for a file name, failing with
    /// [`Error::UnsupportedFormat`] when there is no mapping.
    pub fn for_file_name(name: &str) -> Result<Self> {
        std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedFormat {
                name: name.to_string(),
            })
    }

    /// The canonical string form, e.g. `audio/mp4`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioMp4 => "audio/mp4",
            Self::AudioMpeg => "audio/mpeg",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
