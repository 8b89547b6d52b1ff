//! ffmpeg-backed [`Transformer`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lp_core::{Blob, Result, TransformSpec, Transformer};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Flags shared by both recipes: drop container metadata, chapters and any
/// video stream (cover art), and move the index to the front for streaming.
const STRIP_FLAGS: &[&str] = &["-map_metadata", "-1", "-map_chapters", "-1", "-vn"];
const FASTSTART_FLAGS: &[&str] = &["-movflags", "+faststart"];

/// Low-quality variant: mono AAC at 64 kbit/s.
const LOW_QUALITY_BITRATE: &str = "64k";
const LOW_QUALITY_CHANNELS: &str = "1";

/// Codec arguments for `spec`, excluding input and output paths.
pub fn codec_args(spec: TransformSpec) -> Vec<&'static str> {
    let mut args = Vec::new();
    match spec {
        TransformSpec::Remux => {
            args.extend_from_slice(STRIP_FLAGS);
            args.extend_from_slice(&["-c:a", "copy"]);
        }
        TransformSpec::LowQuality => {
            args.extend_from_slice(&["-map", "0:a"]);
            args.extend_from_slice(STRIP_FLAGS);
            args.extend_from_slice(&[
                "-c:a",
                "aac",
                "-b:a",
                LOW_QUALITY_BITRATE,
                "-ac",
                LOW_QUALITY_CHANNELS,
            ]);
        }
    }
    args.extend_from_slice(FASTSTART_FLAGS);
    args
}

/// Runs ffmpeg in a fresh [`Workspace`] for every transformation.
#[derive(Debug, Clone)]
pub struct FfmpegTransformer {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTransformer {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    /// Build a transformer from the registry's ffmpeg entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        let ffmpeg = tools.require("ffmpeg")?;
        Ok(Self::new(ffmpeg.path.clone(), ffmpeg.timeout()))
    }

    fn command(&self, workspace: &Workspace, spec: TransformSpec) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["-y", "-nostdin", "-loglevel", "error", "-i"]);
        cmd.arg(workspace.input().to_string_lossy());
        cmd.args(codec_args(spec));
        cmd.arg(workspace.output().to_string_lossy());
        cmd
    }
}

#[async_trait]
impl Transformer for FfmpegTransformer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn transform(&self, input: &Blob, spec: TransformSpec, output_name: &str) -> Result<Blob> {
        let workspace = Workspace::with_input(input, output_name).await?;

        tracing::info!(
            input = input.name(),
            output = output_name,
            bytes = input.len(),
            "{spec}"
        );

        self.command(&workspace, spec).execute().await?;
        workspace.read_output(self.name()).await
    }
}
