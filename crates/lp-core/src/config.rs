//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the corpus, output, tools, pipeline and manifest. Every
//! section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Result;
use crate::Error;

/// Default number of concurrently running external tool invocations.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default external tool timeout in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub output: OutputConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
    pub manifest: ManifestConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::configuration(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.pipeline.concurrency == 0 {
            warnings.push("pipeline.concurrency is 0; it will be raised to 1".into());
        }

        if self.manifest.cas_base_url.is_empty() {
            warnings.push(
                "manifest.cas_base_url is empty; clients will not be able to resolve objects"
                    .into(),
            );
        } else if !self.manifest.cas_base_url.ends_with('/') {
            warnings.push(format!(
                "manifest.cas_base_url '{}' does not end with '/'",
                self.manifest.cas_base_url
            ));
        }

        if self.manifest.build_version == 0 {
            warnings.push("manifest.build_version is 0".into());
        }

        if let Err(e) = self.check_paths() {
            warnings.push(format!("{e}; builds will refuse to run"));
        }

        if self.tools.timeout_secs == 0 {
            warnings.push("tools.timeout_secs is 0; every tool call will time out".into());
        }

        warnings
    }

    /// Reject a cache directory at or below the output directory, which every
    /// build empties.
    pub fn check_paths(&self) -> Result<()> {
        let output = std::path::absolute(&self.output.dir)?;
        let cache = std::path::absolute(&self.output.cache_dir)?;
        if cache.starts_with(&output) {
            return Err(Error::configuration(format!(
                "output.cache_dir {} is inside output.dir {}",
                self.output.cache_dir.display(),
                self.output.dir.display()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Location of the read-only source corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub root: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./corpus"),
        }
    }
}

/// Where built artifacts and the cache live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            cache_dir: PathBuf::from("./.lessonpack-cache"),
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    DEFAULT_TOOL_TIMEOUT_SECS
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// What a corpus build does when one course fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the course out of the corpus manifest and keep going.
    #[default]
    Skip,
    /// Stop the whole build at the first failed course.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(Error::configuration(format!(
                "unknown course failure policy '{other}' (valid: skip, abort)"
            ))),
        }
    }
}

/// Scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of external tool invocations running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub on_course_failure: FailurePolicy,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            on_course_failure: FailurePolicy::default(),
        }
    }
}

/// Values stamped into every manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Schema version consumers use to detect document shape changes.
    #[serde(default = "default_build_version")]
    pub build_version: u32,
    /// Base URL under which the sharded object tree is served.
    pub cas_base_url: String,
}

fn default_build_version() -> u32 {
    1
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            build_version: default_build_version(),
            cas_base_url: String::new(),
        }
    }
}
