//! FFprobe-based [`DurationProbe`] implementation.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format` and reads
//! `format.duration`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lp_core::{Blob, DurationProbe, Error, Result};
use serde::Deserialize;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// A duration probe backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeDurationProbe {
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Build a probe from the registry's ffprobe entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        let ffprobe = tools.require("ffprobe")?;
        Ok(Self::new(ffprobe.path.clone(), ffprobe.timeout()))
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn duration(&self, blob: &Blob) -> Result<f64> {
        // The output slot is unused; ffprobe only reads.
        let workspace = Workspace::with_input(blob, "probe.json").await?;

        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"]);
        cmd.arg(workspace.input().to_string_lossy());

        let output = cmd.execute().await?;
        let seconds = parse_duration(&output.stdout)?;
        tracing::debug!(blob = blob.name(), seconds, "probed duration");
        Ok(seconds)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Extract `format.duration` in seconds from ffprobe JSON output.
pub fn parse_duration(stdout: &str) -> Result<f64> {
    let ff: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| Error::transformation("ffprobe", format!("JSON parse error: {e}")))?;

    let raw = ff
        .format
        .duration
        .ok_or_else(|| Error::transformation("ffprobe", "no duration reported"))?;

    match raw.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(Error::transformation(
            "ffprobe",
            format!("invalid duration '{raw}'"),
        )),
    }
}
