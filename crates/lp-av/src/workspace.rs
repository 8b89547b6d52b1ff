//! Scratch directories for tool invocations.
//!
//! External tools read and write files, while the pipeline passes [`Blob`]s.
//! A [`Workspace`] bridges the two: it materializes the input blob in a
//! temporary directory, hands out an output path, and reads the result back.
//! Everything is removed when the workspace is dropped.

use std::path::{Path, PathBuf};

use lp_core::{Blob, Error, Result};
use tempfile::TempDir;

/// Temporary directory holding one tool invocation's input and output.
pub struct Workspace {
    temp_dir: TempDir,
    input_path: PathBuf,
    output_name: String,
}

impl Workspace {
    /// Create a workspace and write `input` into it.
    ///
    /// Only the extension of the blob's name is kept for the input file, so
    /// source names containing directories or odd characters are harmless.
    pub async fn with_input(input: &Blob, output_name: &str) -> Result<Self> {
        let temp_dir = TempDir::with_prefix("lessonpack-").map_err(|e| {
            Error::transformation("workspace", format!("failed to create temp dir: {e}"))
        })?;

        let input_file = match input.extension() {
            Some(ext) => format!("input.{ext}"),
            None => "input".to_string(),
        };
        let input_path = temp_dir.path().join("in").join(input_file);
        tokio::fs::create_dir_all(temp_dir.path().join("in")).await?;
        tokio::fs::create_dir_all(temp_dir.path().join("out")).await?;
        tokio::fs::write(&input_path, input.data()).await?;

        Ok(Self {
            temp_dir,
            input_path,
            output_name: output_file_name(output_name)?,
        })
    }

    /// Path of the materialized input file.
    pub fn input(&self) -> &Path {
        &self.input_path
    }

    /// Path the tool should write its output to.
    pub fn output(&self) -> PathBuf {
        self.temp_dir.path().join("out").join(&self.output_name)
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read the tool output back as a blob named `output_name`.
    pub async fn read_output(&self, tool: &str) -> Result<Blob> {
        let output = self.output();
        match tokio::fs::read(&output).await {
            Ok(data) => Ok(Blob::new(self.output_name.clone(), data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::transformation(
                tool,
                format!("produced no output file {}", self.output_name),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

fn output_file_name(name: &str) -> Result<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n == name)
        .map(str::to_string)
        .ok_or_else(|| Error::Internal(format!("invalid output name '{name}'")))
}
